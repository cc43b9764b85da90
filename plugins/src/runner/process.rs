use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use steptask_core::error::RunnerError;
use steptask_core::runner::{RunnerPlugin, RunnerSession, RunnerStartArgs};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};

/// Spawns real OS processes through `tokio::process`.
pub struct ProcessRunnerPlugin {}

impl ProcessRunnerPlugin {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ProcessRunnerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunnerPlugin for ProcessRunnerPlugin {
    fn name(&self) -> &str {
        "process"
    }

    async fn start_session(
        &self,
        args: &RunnerStartArgs,
    ) -> Result<Box<dyn RunnerSession>, RunnerError> {
        let stdin = if args.pipe_stdin {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let child = Command::new(&args.program)
            .args(&args.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RunnerError::Spawn {
                program: args.program.clone(),
                source: e,
            })?;

        Ok(Box::new(ProcessSession { child }))
    }
}

struct ProcessSession {
    child: Child,
}

#[async_trait]
impl RunnerSession for ProcessSession {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Unpin + Send>> {
        self.child
            .stdin
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncWrite + Unpin + Send>)
    }

    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
    }

    async fn kill(&mut self) -> Result<(), RunnerError> {
        self.child.kill().await.map_err(RunnerError::Kill)
    }

    async fn wait(&mut self) -> Result<i32, RunnerError> {
        let status = self.child.wait().await.map_err(RunnerError::Wait)?;
        Ok(exit_code(status))
    }
}

/// Signal deaths map to `-signal` on unix; `-1` when no code is available.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

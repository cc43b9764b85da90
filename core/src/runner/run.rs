use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::error::RunnerError;

use super::io_pump;
use super::stdin::spawn_stdin_writer;
use super::traits::RunnerSession;
use super::types::RunOutcome;

pub const DEFAULT_READ_BUFFER_BYTES: usize = 16 * 1024;

pub struct RunSessionArgs<'a> {
    pub session: &'a mut dyn RunnerSession,
    /// Bytes to feed the child's stdin; `None` closes stdin right away.
    pub stdin_payload: Option<Vec<u8>>,
    pub read_buffer_bytes: usize,
    /// No limit when `None`.
    pub timeout: Option<Duration>,
}

type Pump = JoinHandle<Result<Vec<u8>, RunnerError>>;

/// Exchanges data with a started session and waits for it to exit.
///
/// Stdin is written while stdout and stderr drain, so a child that fills its
/// output pipe before consuming all input cannot wedge the exchange. Every
/// spawned helper is joined or aborted before this returns.
pub async fn run_session(args: RunSessionArgs<'_>) -> Result<RunOutcome, RunnerError> {
    let RunSessionArgs {
        session,
        stdin_payload,
        read_buffer_bytes,
        timeout,
    } = args;

    let started_at = Instant::now();

    let stdout = session
        .stdout()
        .ok_or(RunnerError::MissingPipe("stdout"))?;
    let stderr = session
        .stderr()
        .ok_or(RunnerError::MissingPipe("stderr"))?;

    let mut stdin_task = match stdin_payload {
        Some(payload) => {
            let stdin = session.stdin().ok_or(RunnerError::MissingPipe("stdin"))?;
            Some(spawn_stdin_writer(stdin, payload))
        }
        None => {
            drop(session.stdin());
            None
        }
    };

    let mut out_task = io_pump::pump_stdout(stdout, read_buffer_bytes);
    let mut err_task = io_pump::pump_stderr(stderr, read_buffer_bytes);

    let exchanged = {
        let fut = exchange(
            &mut *session,
            &mut out_task,
            &mut err_task,
            stdin_task.as_mut(),
        );
        match timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
            None => Some(fut.await),
        }
    };

    let Some(result) = exchanged else {
        let after_ms = timeout.map(|t| t.as_millis() as u64).unwrap_or_default();
        tracing::warn!(timeout_ms = after_ms, pid = ?session.pid(), "child exceeded timeout, killing");
        if let Err(e) = session.kill().await {
            tracing::warn!(error = %e, "kill after timeout failed");
        }
        out_task.abort();
        err_task.abort();
        if let Some(task) = stdin_task {
            task.abort();
        }
        return Err(RunnerError::Timeout(after_ms));
    };

    let (exit_code, stdout, stderr) = result?;
    Ok(RunOutcome {
        exit_code,
        stdout,
        stderr,
        duration_ms: started_at.elapsed().as_millis() as u64,
    })
}

async fn exchange(
    session: &mut dyn RunnerSession,
    out_task: &mut Pump,
    err_task: &mut Pump,
    stdin_task: Option<&mut JoinHandle<Result<u64, RunnerError>>>,
) -> Result<(i32, Vec<u8>, Vec<u8>), RunnerError> {
    let (status, stdout, stderr) = tokio::join!(session.wait(), out_task, err_task);

    if let Some(task) = stdin_task {
        let written = task.await.map_err(join_error)??;
        tracing::trace!(bytes = written, "stdin delivered");
    }

    let exit_code = status?;
    let stdout = stdout.map_err(join_error)??;
    let stderr = stderr.map_err(join_error)??;
    Ok((exit_code, stdout, stderr))
}

fn join_error(e: tokio::task::JoinError) -> RunnerError {
    RunnerError::Join(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::traits::RunnerSession;
    use async_trait::async_trait;
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};

    /// In-memory child: echoes stdin to stdout in small pieces, then exits.
    struct EchoSession {
        stdin: Option<DuplexStream>,
        stdout: Option<DuplexStream>,
        stderr: Option<DuplexStream>,
        worker: Option<JoinHandle<()>>,
        hang: bool,
        killed: bool,
    }

    impl EchoSession {
        fn new(hang: bool) -> Self {
            let (stdin_parent, mut stdin_child) = tokio::io::duplex(16);
            let (mut stdout_child, stdout_parent) = tokio::io::duplex(16);
            let (mut stderr_child, stderr_parent) = tokio::io::duplex(16);

            let worker = tokio::spawn(async move {
                if hang {
                    std::future::pending::<()>().await;
                }
                let mut buf = [0u8; 8];
                loop {
                    let n = stdin_child.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    if stdout_child.write_all(&buf[..n]).await.is_err() {
                        break;
                    }
                }
                let _ = stderr_child.write_all(b"done").await;
            });

            Self {
                stdin: Some(stdin_parent),
                stdout: Some(stdout_parent),
                stderr: Some(stderr_parent),
                worker: Some(worker),
                hang,
                killed: false,
            }
        }
    }

    #[async_trait]
    impl RunnerSession for EchoSession {
        fn pid(&self) -> Option<u32> {
            None
        }

        fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Unpin + Send>> {
            self.stdin
                .take()
                .map(|s| Box::new(s) as Box<dyn AsyncWrite + Unpin + Send>)
        }

        fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
            self.stdout
                .take()
                .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
        }

        fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>> {
            self.stderr
                .take()
                .map(|s| Box::new(s) as Box<dyn AsyncRead + Unpin + Send>)
        }

        async fn kill(&mut self) -> Result<(), RunnerError> {
            if let Some(worker) = self.worker.take() {
                worker.abort();
            }
            self.killed = true;
            Ok(())
        }

        async fn wait(&mut self) -> Result<i32, RunnerError> {
            if let Some(worker) = self.worker.take() {
                let _ = worker.await;
            }
            Ok(if self.hang { 1 } else { 0 })
        }
    }

    #[tokio::test]
    async fn payload_larger_than_pipes_does_not_deadlock() {
        let mut session = EchoSession::new(false);
        let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();

        let outcome = run_session(RunSessionArgs {
            session: &mut session,
            stdin_payload: Some(payload.clone()),
            read_buffer_bytes: 7,
            timeout: Some(Duration::from_secs(10)),
        })
        .await
        .unwrap();

        assert_eq!(outcome.exit_code, 0);
        assert_eq!(outcome.stdout, payload);
        assert_eq!(outcome.stderr, b"done");
    }

    #[tokio::test]
    async fn no_payload_closes_stdin() {
        let mut session = EchoSession::new(false);
        let outcome = run_session(RunSessionArgs {
            session: &mut session,
            stdin_payload: None,
            read_buffer_bytes: DEFAULT_READ_BUFFER_BYTES,
            timeout: None,
        })
        .await
        .unwrap();

        assert!(outcome.stdout.is_empty());
        assert_eq!(outcome.stderr, b"done");
    }

    #[tokio::test]
    async fn timeout_kills_the_session() {
        let mut session = EchoSession::new(true);
        let err = run_session(RunSessionArgs {
            session: &mut session,
            stdin_payload: None,
            read_buffer_bytes: DEFAULT_READ_BUFFER_BYTES,
            timeout: Some(Duration::from_millis(50)),
        })
        .await
        .unwrap_err();

        assert!(matches!(err, RunnerError::Timeout(50)));
        assert!(session.killed);
    }
}

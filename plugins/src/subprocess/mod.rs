//! A task that runs one external program per step.
//!
//! Construction validates the parameter mapping ([`SubprocessTaskConfig`]).
//! `execute` spawns the program, exchanges stdin/stdout/stderr without
//! risking a pipe deadlock, then hands the captured streams and exit code to
//! the output assembler. Only failure to run the program is an error; the
//! program's own exit status is returned as data.
mod config;
mod output;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use steptask_core::backend::{Backend, BackendSlot, TaskEvent};
use steptask_core::config::RunnerConfig;
use steptask_core::context::{ExecutionContext, Outputs, TaskParams};
use steptask_core::error::TaskError;
use steptask_core::runner::{run_session, RunSessionArgs, RunnerPlugin};
use steptask_core::task::Task;
use tracing::Instrument;
use uuid::Uuid;

use crate::runner::ProcessRunnerPlugin;

pub use config::{
    Script, StdinSource, StreamSink, SubprocessTaskConfig, DEFAULT_RETURNCODE_KEY,
    DEFAULT_STDERR_KEY, DEFAULT_STDOUT_KEY,
};

pub struct SubprocessTask {
    params: TaskParams,
    config: SubprocessTaskConfig,
    runner_cfg: RunnerConfig,
    runner: Arc<dyn RunnerPlugin>,
    backend: BackendSlot,
}

impl SubprocessTask {
    pub const NAME: &'static str = "Subprocess Task";

    pub fn new(params: TaskParams) -> Result<Self, TaskError> {
        let config = SubprocessTaskConfig::from_params(&params)?;
        Ok(Self {
            params,
            config,
            runner_cfg: RunnerConfig::default(),
            runner: Arc::new(ProcessRunnerPlugin::new()),
            backend: BackendSlot::default(),
        })
    }

    pub fn with_runner_config(mut self, runner_cfg: RunnerConfig) -> Self {
        self.runner_cfg = runner_cfg;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn RunnerPlugin>) -> Self {
        self.runner = runner;
        self
    }

    async fn run(
        &self,
        ctx: &ExecutionContext,
        previous_outputs: &Outputs,
    ) -> Result<Outputs, TaskError> {
        let start_args = self
            .config
            .start_args(self.runner_cfg.default_shell.as_deref())?;

        let staged = match self.config.stdin_file() {
            Some(path) => Some(tokio::fs::read(path).await.map_err(|e| TaskError::Io {
                op: "read stdin file",
                target: path.display().to_string(),
                source: e,
            })?),
            None => None,
        };

        let command = start_args.display();
        tracing::debug!(runner = self.runner.name(), %command, "spawning subprocess");
        let mut session = self.runner.start_session(&start_args).await?;
        self.report(TaskEvent::started(
            Self::NAME,
            ctx.step_id(),
            command,
            session.pid(),
        ));

        let stdin_payload = match self.config.stdin_key() {
            Some(key) => match previous_outputs.get(key) {
                Some(value) => Some(stdin_bytes(value)),
                None => {
                    if let Err(e) = session.kill().await {
                        tracing::warn!(error = %e, "kill after missing stdin key failed");
                    }
                    return Err(TaskError::MissingInput {
                        key: key.to_string(),
                    });
                }
            },
            None => staged,
        };

        let timeout = self
            .config
            .timeout_ms
            .or(self.runner_cfg.default_timeout_ms)
            .map(Duration::from_millis);

        let outcome = run_session(RunSessionArgs {
            session: session.as_mut(),
            stdin_payload,
            read_buffer_bytes: self.runner_cfg.read_buffer_bytes,
            timeout,
        })
        .await?;

        tracing::info!(
            exit_code = outcome.exit_code,
            duration_ms = outcome.duration_ms,
            stdout_bytes = outcome.stdout.len(),
            stderr_bytes = outcome.stderr.len(),
            "subprocess exited"
        );

        let output = output::assemble(&self.config, &outcome).await?;
        self.report(TaskEvent::finished(
            Self::NAME,
            ctx.step_id(),
            outcome.exit_code,
            outcome.duration_ms,
        ));
        Ok(output)
    }
}

impl std::fmt::Debug for SubprocessTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubprocessTask")
            .field("config", &self.config)
            .field("runner", &self.runner.name())
            .field("backend", &self.backend)
            .finish()
    }
}

#[async_trait]
impl Task for SubprocessTask {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn params(&self) -> &TaskParams {
        &self.params
    }

    fn register_backend(&mut self, backend: &Arc<dyn Backend>) {
        self.backend.set(backend);
    }

    fn backend(&self) -> Option<Arc<dyn Backend>> {
        self.backend.get()
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        previous_outputs: &Outputs,
    ) -> Result<Outputs, TaskError> {
        let span = tracing::info_span!(
            "subprocess_task",
            execution_id = %Uuid::new_v4(),
            step_id = %ctx.step_id(),
            workflow_id = ctx.workflow_id(),
        );

        let result = self.run(ctx, previous_outputs).instrument(span).await;
        if let Err(e) = &result {
            tracing::warn!(step_id = %ctx.step_id(), error = %e, "subprocess task failed");
            self.report(TaskEvent::failed(Self::NAME, ctx.step_id(), e.to_string()));
        }
        result
    }
}

/// Strings are fed verbatim and null as nothing (stdin is just closed);
/// any other value as its JSON text.
fn stdin_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => s.as_bytes().to_vec(),
        other => other.to_string().into_bytes(),
    }
}

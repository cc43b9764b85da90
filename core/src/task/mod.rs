//! The execution contract a workflow engine calls once per step.
use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::{Backend, BackendSlot, TaskEvent};
use crate::context::{ExecutionContext, Outputs, TaskParams};
use crate::error::TaskError;

#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    fn params(&self) -> &TaskParams;

    /// Stores a non-owning reference used only for reporting. Calling it again replaces it.
    fn register_backend(&mut self, backend: &Arc<dyn Backend>);

    fn backend(&self) -> Option<Arc<dyn Backend>>;

    /// Reports to the backend if it is still alive; a dropped backend is skipped.
    fn report(&self, event: TaskEvent) {
        if let Some(backend) = self.backend() {
            backend.report(&event);
        }
    }

    /// Runs the task. Every concrete variant overrides this.
    async fn execute(
        &self,
        _ctx: &ExecutionContext,
        _previous_outputs: &Outputs,
    ) -> Result<Outputs, TaskError> {
        Err(TaskError::Unimplemented {
            task: self.name().to_string(),
        })
    }
}

/// The generic variant: holds parameters, executes nothing.
#[derive(Debug, Clone, Default)]
pub struct BaseTask {
    params: TaskParams,
    backend: BackendSlot,
}

impl BaseTask {
    pub const NAME: &'static str = "Base Task";

    pub fn new(params: TaskParams) -> Self {
        Self {
            params,
            backend: BackendSlot::default(),
        }
    }
}

#[async_trait]
impl Task for BaseTask {
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
}

use std::collections::BTreeMap;

use serde_json::Value;

/// Raw parameter mapping a task is constructed from.
pub type TaskParams = serde_json::Map<String, Value>;

/// Result mapping produced by one execution, and the shape of earlier steps' outputs.
pub type Outputs = BTreeMap<String, Value>;

/// Parameter key under which the engine stores the task-type tag.
pub const TASK_NAME_KEY: &str = "_fw_name";

/// Identity of the workflow step a task runs for.
///
/// Owned by the engine; tasks only read it. Outputs of earlier steps are passed
/// next to it as a separate read-only [`Outputs`] view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    step_id: String,
    workflow_id: Option<String>,
}

impl ExecutionContext {
    pub fn new(step_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            workflow_id: None,
        }
    }

    pub fn with_workflow_id(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub fn workflow_id(&self) -> Option<&str> {
        self.workflow_id.as_deref()
    }
}

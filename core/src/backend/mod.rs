//! Side-channel reporting to the component that drives tasks.
use std::sync::{Arc, Weak};

use serde::Serialize;

/// The store/runner a task may report to. Tasks never own it.
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;

    fn report(&self, event: &TaskEvent);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    Started {
        ts: String,
        task: String,
        step_id: String,
        command: String,
        pid: Option<u32>,
    },
    Finished {
        ts: String,
        task: String,
        step_id: String,
        exit_code: i32,
        duration_ms: u64,
    },
    Failed {
        ts: String,
        task: String,
        step_id: String,
        error: String,
    },
}

impl TaskEvent {
    pub fn started(task: &str, step_id: &str, command: String, pid: Option<u32>) -> Self {
        Self::Started {
            ts: now(),
            task: task.to_string(),
            step_id: step_id.to_string(),
            command,
            pid,
        }
    }

    pub fn finished(task: &str, step_id: &str, exit_code: i32, duration_ms: u64) -> Self {
        Self::Finished {
            ts: now(),
            task: task.to_string(),
            step_id: step_id.to_string(),
            exit_code,
            duration_ms,
        }
    }

    pub fn failed(task: &str, step_id: &str, error: String) -> Self {
        Self::Failed {
            ts: now(),
            task: task.to_string(),
            step_id: step_id.to_string(),
            error,
        }
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Weak, non-owning slot for a registered backend.
#[derive(Default, Clone)]
pub struct BackendSlot {
    inner: Option<Weak<dyn Backend>>,
}

impl BackendSlot {
    pub fn set(&mut self, backend: &Arc<dyn Backend>) {
        self.inner = Some(Arc::downgrade(backend));
    }

    pub fn get(&self) -> Option<Arc<dyn Backend>> {
        self.inner.as_ref().and_then(Weak::upgrade)
    }
}

impl std::fmt::Debug for BackendSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSlot")
            .field("name", &self.get().map(|b| b.name().to_string()))
            .finish()
    }
}

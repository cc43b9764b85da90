use std::sync::{Arc, Mutex};

use serde_json::Value;
use steptask_core::api::{Backend, ExecutionContext, Outputs, Task, TaskError, TaskEvent, TaskParams};
use steptask_plugins::SubprocessTask;

pub fn params(v: Value) -> TaskParams {
    match v {
        Value::Object(map) => map,
        _ => panic!("params must be an object"),
    }
}

pub fn outputs(v: Value) -> Outputs {
    params(v).into_iter().collect()
}

pub async fn run(v: Value, previous: Outputs) -> Result<Outputs, TaskError> {
    let task = SubprocessTask::new(params(v))?;
    task.execute(&ExecutionContext::new("step-1"), &previous).await
}

#[derive(Default)]
pub struct RecordingBackend {
    pub events: Mutex<Vec<TaskEvent>>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| match e {
                TaskEvent::Started { .. } => "started",
                TaskEvent::Finished { .. } => "finished",
                TaskEvent::Failed { .. } => "failed",
            })
            .collect()
    }
}

impl Backend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn report(&self, event: &TaskEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

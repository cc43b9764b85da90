use steptask_core::config::RunnerConfig;
use steptask_core::context::{TaskParams, TASK_NAME_KEY};
use steptask_core::error::TaskError;
use steptask_core::task::{BaseTask, Task};

use crate::subprocess::SubprocessTask;

pub fn build_task(name: &str, params: TaskParams) -> Result<Box<dyn Task>, TaskError> {
    build_task_with_config(name, params, &RunnerConfig::default())
}

pub fn build_task_with_config(
    name: &str,
    params: TaskParams,
    runner_cfg: &RunnerConfig,
) -> Result<Box<dyn Task>, TaskError> {
    match name {
        SubprocessTask::NAME | "subprocess" => Ok(Box::new(
            SubprocessTask::new(params)?.with_runner_config(runner_cfg.clone()),
        )),
        BaseTask::NAME => Ok(Box::new(BaseTask::new(params))),
        other => Err(TaskError::Config(format!("unknown task type '{other}'"))),
    }
}

/// Builds the task named by the `_fw_name` tag inside `params`.
pub fn build_task_from_params(params: TaskParams) -> Result<Box<dyn Task>, TaskError> {
    let name = params
        .get(TASK_NAME_KEY)
        .and_then(|v| v.as_str())
        .ok_or_else(|| TaskError::Config(format!("parameters carry no '{TASK_NAME_KEY}' tag")))?
        .to_string();
    build_task(&name, params)
}

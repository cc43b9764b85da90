pub mod factory;
pub mod runner;
pub mod subprocess;

pub use factory::{build_task, build_task_from_params, build_task_with_config};
pub use runner::ProcessRunnerPlugin;
pub use subprocess::{SubprocessTask, SubprocessTaskConfig};

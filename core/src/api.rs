//! Stable re-exports for consumers (`plugins` and external crates).
//!
//! Prefer importing from `steptask_core::api` instead of reaching into internal modules.

pub use crate::backend::{Backend, BackendSlot, TaskEvent};
pub use crate::config::{load_default, load_from_path, AppConfig, LoggingConfig, RunnerConfig};
pub use crate::context::{ExecutionContext, Outputs, TaskParams, TASK_NAME_KEY};
pub use crate::error::{RunnerError, TaskError, TaskErrorKind};
pub use crate::logging::init_tracing;
pub use crate::runner::{
    run_session, RunOutcome, RunSessionArgs, RunnerPlugin, RunnerSession, RunnerStartArgs,
};
pub use crate::task::{BaseTask, Task};
pub use crate::util::{split, SplitError};

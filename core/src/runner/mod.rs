mod io_pump;
mod run;
mod stdin;
mod traits;
pub mod types;

pub use run::{run_session, RunSessionArgs, DEFAULT_READ_BUFFER_BYTES};
pub use traits::{RunnerPlugin, RunnerSession};
pub use types::{RunOutcome, RunnerStartArgs};

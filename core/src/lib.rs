//! Task contract and process-runner building blocks for workflow steps.
//!
//! Concrete tasks live in `steptask-plugins`; this crate holds what they share.
pub mod api;
pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod runner;
pub mod task;
pub mod util;

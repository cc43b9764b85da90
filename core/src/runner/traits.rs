use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::RunnerError;

use super::types::RunnerStartArgs;

#[async_trait]
pub trait RunnerSession: Send {
    fn pid(&self) -> Option<u32>;
    fn stdin(&mut self) -> Option<Box<dyn AsyncWrite + Unpin + Send>>;
    fn stdout(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    fn stderr(&mut self) -> Option<Box<dyn AsyncRead + Unpin + Send>>;
    /// Kills the child and reaps it.
    async fn kill(&mut self) -> Result<(), RunnerError>;
    /// Waits for exit and returns the exit code.
    async fn wait(&mut self) -> Result<i32, RunnerError>;
}

#[async_trait]
pub trait RunnerPlugin: Send + Sync {
    fn name(&self) -> &str;
    async fn start_session(
        &self,
        args: &RunnerStartArgs,
    ) -> Result<Box<dyn RunnerSession>, RunnerError>;
}

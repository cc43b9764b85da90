use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;

use crate::error::RunnerError;

/// Feeds `payload` to the child and closes its stdin.
///
/// A child that exits without reading all of it closes the pipe early; that
/// broken pipe is not an error.
pub fn spawn_stdin_writer(
    mut stdin: Box<dyn AsyncWrite + Unpin + Send>,
    payload: Vec<u8>,
) -> JoinHandle<Result<u64, RunnerError>> {
    tokio::spawn(async move {
        if let Err(e) = write_and_flush(&mut stdin, &payload).await {
            if e.kind() == std::io::ErrorKind::BrokenPipe {
                tracing::debug!(bytes = payload.len(), "child closed stdin before reading all input");
                return Ok(0);
            }
            return Err(RunnerError::StreamIo {
                stream: "stdin",
                source: e,
            });
        }
        drop(stdin);
        Ok(payload.len() as u64)
    })
}

async fn write_and_flush(
    stdin: &mut Box<dyn AsyncWrite + Unpin + Send>,
    payload: &[u8],
) -> std::io::Result<()> {
    stdin.write_all(payload).await?;
    stdin.flush().await?;
    stdin.shutdown().await
}

use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;

use crate::error::RunnerError;

pub fn pump_stdout<R>(rd: R, chunk_bytes: usize) -> JoinHandle<Result<Vec<u8>, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    pump(rd, "stdout", chunk_bytes)
}

pub fn pump_stderr<R>(rd: R, chunk_bytes: usize) -> JoinHandle<Result<Vec<u8>, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    pump(rd, "stderr", chunk_bytes)
}

/// Drains `rd` to EOF and returns every byte read.
fn pump<R>(
    mut rd: R,
    label: &'static str,
    chunk_bytes: usize,
) -> JoinHandle<Result<Vec<u8>, RunnerError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; chunk_bytes.max(1)];
        let mut captured = Vec::new();

        loop {
            let n = rd.read(&mut buf).await.map_err(|e| RunnerError::StreamIo {
                stream: label,
                source: e,
            })?;
            if n == 0 {
                break;
            }
            captured.extend_from_slice(&buf[..n]);
            tracing::trace!(stream = label, bytes = n, total = captured.len(), "drained");
        }

        Ok(captured)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn captures_everything_until_eof() {
        let (mut wr, rd) = tokio::io::duplex(8);
        let task = pump_stdout(rd, 4);

        wr.write_all(b"hello ").await.unwrap();
        wr.write_all(b"world\nno newline").await.unwrap();
        drop(wr);

        let captured = task.await.unwrap().unwrap();
        assert_eq!(captured, b"hello world\nno newline");
    }

    #[tokio::test]
    async fn empty_stream_yields_empty_capture() {
        let (wr, rd) = tokio::io::duplex(8);
        drop(wr);
        let captured = pump_stderr(rd, 1024).await.unwrap().unwrap();
        assert!(captured.is_empty());
    }
}

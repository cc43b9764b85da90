use std::path::Path;

use serde_json::Value;
use steptask_core::context::Outputs;
use steptask_core::error::TaskError;
use steptask_core::runner::RunOutcome;

use super::config::{StreamSink, SubprocessTaskConfig};

/// Routes captured streams and the exit code to their configured sinks.
///
/// Files get the raw bytes and are overwritten. The exit code is data here;
/// a non-zero value is returned like any other.
pub async fn assemble(cfg: &SubprocessTaskConfig, outcome: &RunOutcome) -> Result<Outputs, TaskError> {
    write_sink_file(&cfg.stdout, &outcome.stdout, "write stdout file").await?;
    write_sink_file(&cfg.stderr, &outcome.stderr, "write stderr file").await?;

    let mut output = Outputs::new();
    if let Some(key) = &cfg.stdout.key {
        output.insert(key.clone(), text_value(&outcome.stdout));
    }
    if let Some(key) = &cfg.stderr.key {
        output.insert(key.clone(), text_value(&outcome.stderr));
    }
    if let Some(key) = &cfg.returncode_key {
        output.insert(key.clone(), Value::from(outcome.exit_code));
    }
    Ok(output)
}

async fn write_sink_file(sink: &StreamSink, bytes: &[u8], op: &'static str) -> Result<(), TaskError> {
    let Some(path) = sink.file.as_deref() else {
        return Ok(());
    };
    write_file(path, bytes, op).await
}

async fn write_file(path: &Path, bytes: &[u8], op: &'static str) -> Result<(), TaskError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| TaskError::Io {
            op,
            target: path.display().to_string(),
            source: e,
        })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "{op}");
    Ok(())
}

fn text_value(bytes: &[u8]) -> Value {
    Value::String(String::from_utf8_lossy(bytes).into_owned())
}

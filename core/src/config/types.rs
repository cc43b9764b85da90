use serde::{Deserialize, Serialize};

use crate::runner::DEFAULT_READ_BUFFER_BYTES;

/// Host-level settings, loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "steptask_plugins=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Settings shared by every subprocess a host runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Chunk size used when draining stdout/stderr.
    #[serde(default = "default_read_buffer_bytes")]
    pub read_buffer_bytes: usize,

    /// Applied when a task sets no `timeout_ms`. Unset means wait forever.
    #[serde(default)]
    pub default_timeout_ms: Option<u64>,

    /// Shell binary for `use_shell` tasks without `shell_exe`.
    #[serde(default)]
    pub default_shell: Option<String>,
}

fn default_read_buffer_bytes() -> usize {
    DEFAULT_READ_BUFFER_BYTES
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            read_buffer_bytes: default_read_buffer_bytes(),
            default_timeout_ms: None,
            default_shell: None,
        }
    }
}

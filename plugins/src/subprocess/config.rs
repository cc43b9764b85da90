use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use steptask_core::context::{TaskParams, TASK_NAME_KEY};
use steptask_core::error::TaskError;
use steptask_core::runner::RunnerStartArgs;
use steptask_core::util::split;

pub const DEFAULT_STDOUT_KEY: &str = "_stdout";
pub const DEFAULT_STDERR_KEY: &str = "_stderr";
pub const DEFAULT_RETURNCODE_KEY: &str = "_returncode";

/// The command as configured: one string, or an explicit argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    Line(String),
    Args(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StdinSource {
    #[default]
    None,
    File(PathBuf),
    Key(String),
}

/// Where one captured stream goes. Both, either or neither may be set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamSink {
    pub file: Option<PathBuf>,
    pub key: Option<String>,
}

/// Validated, immutable configuration of a subprocess task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubprocessTaskConfig {
    pub script: Script,
    pub shell_mode: bool,
    pub token_split: bool,
    pub shell_executable: Option<String>,
    pub stdin: StdinSource,
    pub stdout: StreamSink,
    pub stderr: StreamSink,
    pub returncode_key: Option<String>,
    /// Kill the child after this long. Absent by default.
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParams {
    #[serde(default)]
    script: Option<Value>,
    // Null flags take their defaults, same as absent ones.
    #[serde(default)]
    use_shell: Option<bool>,
    #[serde(default)]
    use_shlex: Option<bool>,
    #[serde(default)]
    shell_exe: Option<String>,
    #[serde(default)]
    stdin_file: Option<PathBuf>,
    #[serde(default)]
    stdin_key: Option<String>,
    #[serde(default)]
    stdout_file: Option<PathBuf>,
    #[serde(default)]
    stderr_file: Option<PathBuf>,
    // Absent takes the default; explicit null disables the key.
    #[serde(default = "default_stdout_key")]
    stdout_key: Option<String>,
    #[serde(default = "default_stderr_key")]
    stderr_key: Option<String>,
    #[serde(default = "default_returncode_key")]
    returncode_key: Option<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

fn default_stdout_key() -> Option<String> {
    Some(DEFAULT_STDOUT_KEY.to_string())
}

fn default_stderr_key() -> Option<String> {
    Some(DEFAULT_STDERR_KEY.to_string())
}

fn default_returncode_key() -> Option<String> {
    Some(DEFAULT_RETURNCODE_KEY.to_string())
}

impl SubprocessTaskConfig {
    /// Validates a raw parameter mapping. Pure: touches no file and spawns nothing.
    pub fn from_params(params: &TaskParams) -> Result<Self, TaskError> {
        let mut params = params.clone();
        params.remove(TASK_NAME_KEY);

        let raw: RawParams = serde_json::from_value(Value::Object(params))
            .map_err(|e| TaskError::Config(format!("invalid subprocess task parameters: {e}")))?;

        let stdin_file = raw.stdin_file.filter(|p| !p.as_os_str().is_empty());
        let stdin_key = non_empty(raw.stdin_key);
        let stdin = match (stdin_file, stdin_key) {
            (Some(_), Some(_)) => {
                return Err(TaskError::Config(
                    "subprocess task cannot take stdin from both stdin_file and stdin_key".into(),
                ))
            }
            (Some(path), None) => StdinSource::File(path),
            (None, Some(key)) => StdinSource::Key(key),
            (None, None) => StdinSource::None,
        };

        let cfg = Self {
            script: coerce_script(raw.script)?,
            shell_mode: raw.use_shell.unwrap_or(false),
            token_split: raw.use_shlex.unwrap_or(true),
            shell_executable: non_empty(raw.shell_exe),
            stdin,
            stdout: StreamSink {
                file: raw.stdout_file.filter(|p| !p.as_os_str().is_empty()),
                key: non_empty(raw.stdout_key),
            },
            stderr: StreamSink {
                file: raw.stderr_file.filter(|p| !p.as_os_str().is_empty()),
                key: non_empty(raw.stderr_key),
            },
            returncode_key: non_empty(raw.returncode_key),
            timeout_ms: match raw.timeout_ms {
                Some(0) => return Err(TaskError::Config("timeout_ms must be positive".into())),
                other => other,
            },
        };

        // Surface quoting mistakes now rather than at execute time.
        cfg.argv()?;
        Ok(cfg)
    }

    pub fn stdin_file(&self) -> Option<&Path> {
        match &self.stdin {
            StdinSource::File(path) => Some(path),
            _ => None,
        }
    }

    pub fn stdin_key(&self) -> Option<&str> {
        match &self.stdin {
            StdinSource::Key(key) => Some(key),
            _ => None,
        }
    }

    /// Argument vector for direct execution, after token splitting when it applies.
    ///
    /// In shell mode the script is returned unsplit; see [`Self::start_args`].
    pub fn argv(&self) -> Result<Vec<String>, TaskError> {
        let argv = match &self.script {
            Script::Args(args) => args.clone(),
            Script::Line(line) if self.shell_mode || !self.token_split => vec![line.clone()],
            Script::Line(line) => split(line)
                .map_err(|e| TaskError::Config(format!("cannot split script {line:?}: {e}")))?,
        };
        if argv.first().map_or(true, |p| p.is_empty()) {
            return Err(TaskError::Config("script resolves to an empty command".into()));
        }
        Ok(argv)
    }

    /// What the runner should spawn.
    pub fn start_args(&self, default_shell: Option<&str>) -> Result<RunnerStartArgs, TaskError> {
        let mut argv = self.argv()?;
        let args = if self.shell_mode {
            let shell = self
                .shell_executable
                .as_deref()
                .or(default_shell)
                .map(str::to_string)
                .unwrap_or_else(platform_shell);
            shell_args(shell, argv)
        } else {
            let program = argv.remove(0);
            RunnerStartArgs::new(program, argv)
        };
        Ok(args.with_stdin(!matches!(self.stdin, StdinSource::None)))
    }
}

#[cfg(unix)]
fn platform_shell() -> String {
    "/bin/sh".to_string()
}

#[cfg(windows)]
fn platform_shell() -> String {
    std::env::var("ComSpec").unwrap_or_else(|_| "cmd.exe".to_string())
}

/// The first element is the command string; the rest become `$0`, `$1`, ...
#[cfg(unix)]
fn shell_args(shell: String, argv: Vec<String>) -> RunnerStartArgs {
    let mut args = Vec::with_capacity(argv.len() + 1);
    args.push("-c".to_string());
    args.extend(argv);
    RunnerStartArgs::new(shell, args)
}

#[cfg(windows)]
fn shell_args(shell: String, argv: Vec<String>) -> RunnerStartArgs {
    RunnerStartArgs::new(shell, vec!["/C".to_string(), argv.join(" ")])
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn coerce_script(value: Option<Value>) -> Result<Script, TaskError> {
    match value {
        None | Some(Value::Null) => Err(TaskError::Config(
            "subprocess task requires a 'script' parameter".into(),
        )),
        Some(Value::Array(items)) => {
            if items.is_empty() {
                return Err(TaskError::Config("script argument list is empty".into()));
            }
            items
                .into_iter()
                .map(|item| {
                    scalar_to_string(&item).ok_or_else(|| {
                        TaskError::Config(format!("script arguments must be scalars, got {item}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Script::Args)
        }
        Some(other) => match scalar_to_string(&other) {
            Some(line) if !line.trim().is_empty() => Ok(Script::Line(line)),
            Some(_) => Err(TaskError::Config("script is empty".into())),
            None => Err(TaskError::Config(format!(
                "script must be a string or an argument list, got {other}"
            ))),
        },
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

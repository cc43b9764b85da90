use thiserror::Error;

/// Error kinds a workflow engine branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskErrorKind {
    Configuration,
    Unimplemented,
    Spawn,
    Io,
    Timeout,
}

/// Failure to run a task. A child that exits non-zero is not one of these.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("config error: {0}")]
    Config(String),

    #[error("task '{task}' does not implement execute")]
    Unimplemented { task: String },

    #[error("spawn failed for '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{op} failed for {target}: {source}")]
    Io {
        op: &'static str,
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stdin key '{key}' not found in previous outputs")]
    MissingInput { key: String },

    #[error("subprocess timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("runner failed: {0}")]
    Runner(RunnerError),
}

impl TaskError {
    pub fn kind(&self) -> TaskErrorKind {
        match self {
            Self::Config(_) => TaskErrorKind::Configuration,
            Self::Unimplemented { .. } => TaskErrorKind::Unimplemented,
            Self::Spawn { .. } => TaskErrorKind::Spawn,
            Self::Io { .. } => TaskErrorKind::Io,
            Self::MissingInput { .. } => TaskErrorKind::Io,
            Self::Timeout { .. } => TaskErrorKind::Timeout,
            Self::Runner(e) => match e {
                RunnerError::Spawn { .. } => TaskErrorKind::Spawn,
                RunnerError::Timeout(_) => TaskErrorKind::Timeout,
                _ => TaskErrorKind::Io,
            },
        }
    }
}

impl From<RunnerError> for TaskError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::Spawn { program, source } => Self::Spawn { program, source },
            RunnerError::Timeout(after_ms) => Self::Timeout { after_ms },
            other => Self::Runner(other),
        }
    }
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("spawn failed: {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("missing {0} pipe")]
    MissingPipe(&'static str),
    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },
    #[error("wait failed: {0}")]
    Wait(std::io::Error),
    #[error("kill failed: {0}")]
    Kill(std::io::Error),
    #[error("pump task failed: {0}")]
    Join(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
}

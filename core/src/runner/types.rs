/// What to spawn. Stdout and stderr are always piped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerStartArgs {
    pub program: String,
    pub args: Vec<String>,
    /// Pipe stdin when true, otherwise attach it to the null device.
    pub pipe_stdin: bool,
}

impl RunnerStartArgs {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            pipe_stdin: false,
        }
    }

    pub fn with_stdin(mut self, pipe_stdin: bool) -> Self {
        self.pipe_stdin = pipe_stdin;
        self
    }

    /// Command line for logs and reports. Not meant to be re-parsed.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything a finished child left behind. Streams are captured in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub duration_ms: u64,
}

//! Delegation error types.

/// Errors that can occur while handing a task to the runner.
#[derive(thiserror::Error, Debug)]
pub enum DelegateError {
    /// The runner binary was not found.
    #[error("Runner binary not found: {0}")]
    RunnerNotFound(String),

    /// Permission denied when spawning the runner.
    #[error("Permission denied running {0}")]
    PermissionDenied(String),

    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DelegateError {
    /// Classify a spawn failure for `program`.
    pub(crate) fn from_spawn(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::RunnerNotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::Io(err),
        }
    }

    /// Process exit code to report, following shell conventions.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RunnerNotFound(_) => 127,
            Self::PermissionDenied(_) => 126,
            Self::Io(_) => 1,
        }
    }
}

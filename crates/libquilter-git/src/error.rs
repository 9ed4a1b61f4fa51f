use libquilter_core::QuilterError;
use thiserror::Error;

/// Errors from git subprocess invocations and history parsing
#[derive(Debug, Error)]
pub enum GitError {
    #[error("git {args:?} exited with status {status}: {stderr}")]
    CommandFailed {
        args: Vec<String>,
        status: i32,
        stderr: String,
    },

    #[error("unparseable git output: {0}")]
    Parse(String),

    #[error("failed to run git: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] QuilterError),

    #[error("{failed} of {total} repositories failed to refresh")]
    RefreshIncomplete { failed: usize, total: usize },
}

impl GitError {
    /// Get the exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            GitError::CommandFailed { .. } => 6,
            GitError::Parse(_) => 1,
            GitError::Io(_) => 5,
            GitError::Core(e) => e.exit_code(),
            GitError::RefreshIncomplete { .. } => 1,
        }
    }
}

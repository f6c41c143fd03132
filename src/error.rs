use std::path::PathBuf;

use thiserror::Error;

use crate::hooks::HookPoint;

/// Process exit code for a successful release.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code for configuration and other unclassified errors.
pub const EXIT_FAILURE: i32 = 1;
/// Process exit code when the working tree is dirty at Init.
pub const EXIT_DIRTY_REPO: i32 = 3;
/// Process exit code when the test command fails.
pub const EXIT_TEST_FAILURE: i32 = 4;
/// Process exit code when the clean command fails.
pub const EXIT_CLEAN_FAILURE: i32 = 5;
/// Process exit code when a VCS operation fails.
pub const EXIT_VCS_FAILURE: i32 = 6;
/// Process exit code when a hook fails.
pub const EXIT_HOOK_FAILURE: i32 = 7;
/// Process exit code for version format and template errors.
pub const EXIT_FORMAT_ERROR: i32 = 8;
/// Process exit code when the release is durable but a later phase failed.
pub const EXIT_PARTIAL_SUCCESS: i32 = 10;

/// Failure of an external command run through the
/// [`CommandRunner`](crate::process::CommandRunner).
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("`{command}` exited with code {code}\nStdout: {stdout}\nStderr: {stderr}")]
    Failed {
        command: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("`{command}` timed out after {seconds}s and was killed")]
    Timeout { command: String, seconds: u64 },

    #[error("Failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl CommandError {
    /// The rendered command line that failed.
    pub fn command(&self) -> &str {
        match self {
            CommandError::Failed { command, .. }
            | CommandError::Timeout { command, .. }
            | CommandError::Spawn { command, .. } => command,
        }
    }
}

/// Unified error type for bumpr operations
#[derive(Error, Debug)]
pub enum BumprError {
    #[error("Version format error: {0}")]
    Format(String),

    #[error("Repository has uncommitted changes, refusing to release")]
    DirtyRepo,

    #[error("Clean command failed: {0}")]
    CleanFailure(#[source] CommandError),

    #[error("Tests failed: {0}")]
    TestFailure(#[source] CommandError),

    #[error("Publish failed: {0}")]
    PublishFailure(#[source] CommandError),

    #[error("VCS {operation} failed: {detail}")]
    Vcs { operation: String, detail: String },

    #[error("Hook '{hook}' failed at {point}: {source}")]
    Hook {
        point: HookPoint,
        hook: String,
        #[source]
        source: Box<BumprError>,
    },

    #[error("Command failed: {0}")]
    Command(#[from] CommandError),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error on {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in bumpr
pub type Result<T> = std::result::Result<T, BumprError>;

impl BumprError {
    /// Create a version format error with context
    pub fn format(msg: impl Into<String>) -> Self {
        BumprError::Format(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        BumprError::Config(msg.into())
    }

    /// Create a template error with context
    pub fn template(msg: impl Into<String>) -> Self {
        BumprError::Template(msg.into())
    }

    /// Create a VCS error for the named operation
    pub fn vcs(operation: impl Into<String>, detail: impl ToString) -> Self {
        BumprError::Vcs {
            operation: operation.into(),
            detail: detail.to_string(),
        }
    }

    /// Attach a path to an I/O error
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BumprError::File {
            path: path.into(),
            source,
        }
    }

    /// Process exit code reported when this error aborts a run.
    pub fn exit_code(&self) -> i32 {
        match self {
            BumprError::Format(_) | BumprError::Template(_) => EXIT_FORMAT_ERROR,
            BumprError::DirtyRepo => EXIT_DIRTY_REPO,
            BumprError::CleanFailure(_) => EXIT_CLEAN_FAILURE,
            BumprError::TestFailure(_) => EXIT_TEST_FAILURE,
            BumprError::PublishFailure(_) => EXIT_PARTIAL_SUCCESS,
            BumprError::Vcs { .. } => EXIT_VCS_FAILURE,
            BumprError::Hook { .. } => EXIT_HOOK_FAILURE,
            BumprError::Command(_)
            | BumprError::Config(_)
            | BumprError::File { .. }
            | BumprError::Io(_) => EXIT_FAILURE,
        }
    }
}

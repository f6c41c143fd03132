use crate::workflow::Phase;
use std::fmt;
use std::path::PathBuf;

/// Non-fatal conditions met during a release.
/// These are collected in the run report and shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// An additional file did not contain the version being replaced
    VersionNotFound { path: PathBuf, version: String },
    /// Commit is disabled, so no commit or tag was made
    CommitDisabled { phase: Phase },
    /// Tagging is disabled while commits are enabled
    TagDisabled,
    /// A post-release phase failed; the release itself is durable
    PhaseFailed { phase: Phase, message: String },
    /// Post-release phases that did not run because an earlier one failed
    PhasesSkipped { phases: Vec<Phase> },
    /// An `on_rollback` hook failed while restoring files
    RollbackHookFailed { hook: String, message: String },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::VersionNotFound { path, version } => {
                write!(
                    f,
                    "Version '{}' not found in '{}', file left unchanged",
                    version,
                    path.display()
                )
            }
            ReleaseWarning::CommitDisabled { phase } => {
                write!(f, "Commit disabled, nothing committed during {}", phase)
            }
            ReleaseWarning::TagDisabled => f.write_str("Tagging disabled, release is not tagged"),
            ReleaseWarning::PhaseFailed { phase, message } => {
                write!(f, "Phase '{}' failed: {}", phase, message)
            }
            ReleaseWarning::PhasesSkipped { phases } => {
                let names: Vec<&str> = phases.iter().map(Phase::name).collect();
                write!(f, "Skipped after failure: {}", names.join(", "))
            }
            ReleaseWarning::RollbackHookFailed { hook, message } => {
                write!(f, "Rollback hook '{}' failed: {}", hook, message)
            }
        }
    }
}

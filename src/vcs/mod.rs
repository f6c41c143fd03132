//! Version-control abstraction layer
//!
//! The workflow only needs four capabilities from a VCS: check that the
//! working tree is clean, stage files, commit and tag. Pushing is optional.
//! Each backend shells out to its command-line client through the shared
//! [`CommandRunner`], so dry-run, timeouts and logging behave the same for
//! every backend.
//!
//! - [git::GitVcs]: `git`
//! - [mercurial::MercurialVcs]: `hg`
//! - [bazaar::BazaarVcs]: `bzr`
//! - [none::NoVcs]: no version control at all
//! - [mock::MockVcs]: in-memory recorder for tests

pub mod bazaar;
pub mod git;
pub mod mercurial;
pub mod mock;
pub mod none;

pub use bazaar::BazaarVcs;
pub use git::GitVcs;
pub use mercurial::MercurialVcs;
pub use mock::{MockVcs, VcsCall};
pub use none::NoVcs;

use crate::error::{BumprError, Result};
use crate::process::{Command, CommandOutput, CommandRunner};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Capabilities the release workflow needs from a version-control backend.
///
/// ## Error Handling
///
/// Backend failures are reported as [BumprError::Vcs] carrying the raw
/// output of the failed command.
pub trait Vcs {
    /// Backend name used in logs
    fn name(&self) -> &'static str;

    /// Whether no tracked file has uncommitted changes.
    ///
    /// This is a read-only query and runs even in dry-run mode.
    fn is_clean(&self) -> Result<bool>;

    /// Mark files for inclusion in the next commit.
    fn stage(&self, paths: &[PathBuf]) -> Result<()>;

    /// Commit the staged files.
    ///
    /// # Returns
    /// * `Err` - If nothing is staged or the backend reports a failure
    fn commit(&self, message: &str) -> Result<()>;

    /// Create an annotated tag at the current revision.
    ///
    /// # Returns
    /// * `Err` - If the tag already exists or the backend reports a failure
    fn tag(&self, name: &str, message: Option<&str>) -> Result<()>;

    /// Push commits and tags to the default remote.
    fn push(&self) -> Result<()>;
}

/// Supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsKind {
    Git,
    Mercurial,
    Bazaar,
    None,
}

impl FromStr for VcsKind {
    type Err = BumprError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "git" => Ok(VcsKind::Git),
            "hg" | "mercurial" => Ok(VcsKind::Mercurial),
            "bzr" | "bazaar" => Ok(VcsKind::Bazaar),
            "none" | "" => Ok(VcsKind::None),
            other => Err(BumprError::config(format!(
                "Unknown VCS '{}': expected git, hg, bzr or none",
                other
            ))),
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VcsKind::Git => "git",
            VcsKind::Mercurial => "hg",
            VcsKind::Bazaar => "bzr",
            VcsKind::None => "none",
        };
        f.write_str(name)
    }
}

/// Build the adapter for `kind`, bound to the working directory `root`.
pub fn open(kind: VcsKind, root: &Path, runner: CommandRunner) -> Box<dyn Vcs> {
    match kind {
        VcsKind::Git => Box::new(GitVcs::new(root, runner)),
        VcsKind::Mercurial => Box::new(MercurialVcs::new(root, runner)),
        VcsKind::Bazaar => Box::new(BazaarVcs::new(root, runner)),
        VcsKind::None => Box::new(NoVcs),
    }
}

/// Run a mutating backend command, mapping failures to [BumprError::Vcs].
pub(crate) fn run(runner: &CommandRunner, operation: &str, command: Command) -> Result<CommandOutput> {
    runner
        .run(&command)
        .map_err(|e| BumprError::vcs(operation, e))
}

/// Run a read-only backend command, mapping failures to [BumprError::Vcs].
pub(crate) fn query(
    runner: &CommandRunner,
    operation: &str,
    command: Command,
) -> Result<CommandOutput> {
    runner
        .query(&command)
        .map_err(|e| BumprError::vcs(operation, e))
}

/// Render paths as command arguments
pub(crate) fn path_args(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

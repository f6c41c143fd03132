use super::Vcs;
use crate::error::Result;
use std::path::PathBuf;
use tracing::debug;

/// Backend for projects without version control: always clean, mutations are no-ops
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVcs;

impl Vcs for NoVcs {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_clean(&self) -> Result<bool> {
        Ok(true)
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        debug!(count = paths.len(), "no VCS: nothing to stage");
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        debug!(message, "no VCS: commit skipped");
        Ok(())
    }

    fn tag(&self, name: &str, _message: Option<&str>) -> Result<()> {
        debug!(name, "no VCS: tag skipped");
        Ok(())
    }

    fn push(&self) -> Result<()> {
        Ok(())
    }
}

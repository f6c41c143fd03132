use crate::error::{BumprError, Result};
use std::fmt;
use std::str::FromStr;

/// One step of the release workflow, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Init,
    Clean,
    Test,
    Bump,
    CommitTag,
    Publish,
    Prepare,
    CommitPrepare,
    Push,
    Done,
}

impl Phase {
    pub const ALL: [Phase; 10] = [
        Phase::Init,
        Phase::Clean,
        Phase::Test,
        Phase::Bump,
        Phase::CommitTag,
        Phase::Publish,
        Phase::Prepare,
        Phase::CommitPrepare,
        Phase::Push,
        Phase::Done,
    ];

    /// Name used in hook points and logs
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Clean => "clean",
            Phase::Test => "test",
            Phase::Bump => "bump",
            Phase::CommitTag => "commit_tag",
            Phase::Publish => "publish",
            Phase::Prepare => "prepare",
            Phase::CommitPrepare => "commit_prepare",
            Phase::Push => "push",
            Phase::Done => "done",
        }
    }

    /// Phases running once the release commit is durable.
    ///
    /// Their failures never roll back and end the run as a partial success.
    pub fn is_post_release(&self) -> bool {
        *self >= Phase::Publish
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Phase {
    type Err = BumprError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Phase::ALL
            .into_iter()
            .find(|phase| phase.name() == normalized)
            .ok_or_else(|| BumprError::config(format!("Unknown phase '{}'", s)))
    }
}

use super::Vcs;
use crate::error::{BumprError, Result};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

/// A call recorded by [MockVcs]
#[derive(Debug, Clone, PartialEq)]
pub enum VcsCall {
    IsClean,
    Stage(Vec<PathBuf>),
    Commit(String),
    Tag(String, Option<String>),
    Push,
}

impl VcsCall {
    /// Whether the call changes repository state
    pub fn is_mutation(&self) -> bool {
        !matches!(self, VcsCall::IsClean)
    }
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<VcsCall>,
    dirty: bool,
    fail_on: Option<&'static str>,
    staged: Vec<PathBuf>,
    tags: Vec<String>,
}

/// Mock VCS for testing without an actual repository.
///
/// Clones share state, so a test can keep one handle while the workflow owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MockVcs {
    state: Rc<RefCell<MockState>>,
}

impl MockVcs {
    /// Create a new clean mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Report uncommitted changes from `is_clean`
    pub fn dirty(self) -> Self {
        self.state.borrow_mut().dirty = true;
        self
    }

    /// Make the named operation (`stage`, `commit`, `tag`, `push`) fail
    pub fn failing_on(self, operation: &'static str) -> Self {
        self.state.borrow_mut().fail_on = Some(operation);
        self
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<VcsCall> {
        self.state.borrow().calls.clone()
    }

    /// Messages of the commits made so far
    pub fn commits(&self) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                VcsCall::Commit(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Tags created so far
    pub fn tags(&self) -> Vec<String> {
        self.state.borrow().tags.clone()
    }

    fn record(&self, call: VcsCall, operation: &'static str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        if state.fail_on == Some(operation) {
            return Err(BumprError::vcs(operation, "mock failure"));
        }
        Ok(())
    }
}

impl Vcs for MockVcs {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_clean(&self) -> Result<bool> {
        self.record(VcsCall::IsClean, "status")?;
        Ok(!self.state.borrow().dirty)
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        self.record(VcsCall::Stage(paths.to_vec()), "stage")?;
        self.state.borrow_mut().staged.extend(paths.iter().cloned());
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.record(VcsCall::Commit(message.to_string()), "commit")?;
        let mut state = self.state.borrow_mut();
        if state.staged.is_empty() {
            return Err(BumprError::vcs("commit", "nothing staged"));
        }
        state.staged.clear();
        Ok(())
    }

    fn tag(&self, name: &str, message: Option<&str>) -> Result<()> {
        self.record(
            VcsCall::Tag(name.to_string(), message.map(str::to_string)),
            "tag",
        )?;
        let mut state = self.state.borrow_mut();
        if state.tags.iter().any(|t| t == name) {
            return Err(BumprError::vcs("tag", format!("tag '{}' already exists", name)));
        }
        state.tags.push(name.to_string());
        Ok(())
    }

    fn push(&self) -> Result<()> {
        self.record(VcsCall::Push, "push")
    }
}

use super::{path_args, query, run, Vcs};
use crate::error::{BumprError, Result};
use crate::process::{Command, CommandRunner};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Bazaar backend driving the system `bzr` binary.
///
/// Like Mercurial, Bazaar commits explicit paths instead of a staging area.
pub struct BazaarVcs {
    root: PathBuf,
    runner: CommandRunner,
    staged: RefCell<Vec<PathBuf>>,
}

impl BazaarVcs {
    pub fn new(root: &Path, runner: CommandRunner) -> Self {
        BazaarVcs {
            root: root.to_path_buf(),
            runner,
            staged: RefCell::new(Vec::new()),
        }
    }

    fn bzr(&self) -> Command {
        Command::new("bzr").current_dir(&self.root)
    }
}

/// Whether a `bzr status --short` line reports a versioned change
fn is_versioned_change(line: &str) -> bool {
    let line = line.trim_end();
    !line.is_empty() && !line.starts_with('?')
}

impl Vcs for BazaarVcs {
    fn name(&self) -> &'static str {
        "bzr"
    }

    fn is_clean(&self) -> Result<bool> {
        let output = query(&self.runner, "status", self.bzr().args(["status", "--short"]))?;
        Ok(!output.stdout.lines().any(is_versioned_change))
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        let mut staged = self.staged.borrow_mut();
        for path in paths {
            if !staged.contains(path) {
                staged.push(path.clone());
            }
        }
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        let paths = self.staged.borrow().clone();
        if paths.is_empty() {
            return Err(BumprError::vcs("commit", "nothing staged"));
        }
        run(
            &self.runner,
            "commit",
            self.bzr().args(["commit", "-m", message]).args(path_args(&paths)),
        )?;
        self.staged.borrow_mut().clear();
        Ok(())
    }

    fn tag(&self, name: &str, _message: Option<&str>) -> Result<()> {
        // Bazaar tags carry no annotation.
        run(&self.runner, "tag", self.bzr().args(["tag", name]))?;
        Ok(())
    }

    fn push(&self) -> Result<()> {
        run(&self.runner, "push", self.bzr().arg("push"))?;
        Ok(())
    }
}

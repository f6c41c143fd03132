use super::{path_args, query, run, Vcs};
use crate::error::{BumprError, Result};
use crate::process::{Command, CommandRunner};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Mercurial backend driving the system `hg` binary.
///
/// Mercurial has no staging area: staged paths are remembered and passed
/// explicitly to `hg commit`.
pub struct MercurialVcs {
    root: PathBuf,
    runner: CommandRunner,
    staged: RefCell<Vec<PathBuf>>,
}

impl MercurialVcs {
    pub fn new(root: &Path, runner: CommandRunner) -> Self {
        MercurialVcs {
            root: root.to_path_buf(),
            runner,
            staged: RefCell::new(Vec::new()),
        }
    }

    fn hg(&self) -> Command {
        Command::new("hg").current_dir(&self.root)
    }
}

impl Vcs for MercurialVcs {
    fn name(&self) -> &'static str {
        "hg"
    }

    fn is_clean(&self) -> Result<bool> {
        let output = query(
            &self.runner,
            "status",
            self.hg()
                .args(["status", "--modified", "--added", "--removed", "--deleted"]),
        )?;
        Ok(output.stdout.trim().is_empty())
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
            self.hg().args(["commit", "-m", message]).args(path_args(&paths)),
        )?;
        self.staged.borrow_mut().clear();
        Ok(())
    }

    fn tag(&self, name: &str, message: Option<&str>) -> Result<()> {
        let mut command = self.hg().arg("tag");
        if let Some(message) = message {
            command = command.args(["-m", message]);
        }
        run(&self.runner, "tag", command.arg(name))?;
        Ok(())
    }

    fn push(&self) -> Result<()> {
        run(&self.runner, "push", self.hg().arg("push"))?;
        Ok(())
    }
}

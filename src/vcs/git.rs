use super::{path_args, query, run, Vcs};
use crate::error::Result;
use crate::process::{Command, CommandRunner};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Git backend driving the system `git` binary
pub struct GitVcs {
    root: PathBuf,
    runner: CommandRunner,
}

impl GitVcs {
    pub fn new(root: &Path, runner: CommandRunner) -> Self {
        GitVcs {
            root: root.to_path_buf(),
            runner,
        }
    }

    fn git(&self) -> Command {
        Command::new("git").current_dir(&self.root)
    }
}

impl Vcs for GitVcs {
    fn name(&self) -> &'static str {
        "git"
    }

    fn is_clean(&self) -> Result<bool> {
        let output = query(
            &self.runner,
            "status",
            self.git()
                .args(["status", "--porcelain", "--untracked-files=no"]),
        )?;
        let dirty: Vec<&str> = output.stdout.lines().filter(|l| !l.trim().is_empty()).collect();
        if !dirty.is_empty() {
            debug!(files = ?dirty, "uncommitted changes");
        }
        Ok(dirty.is_empty())
    }

    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        run(
            &self.runner,
            "add",
            self.git().args(["add", "--"]).args(path_args(paths)),
        )?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        run(&self.runner, "commit", self.git().args(["commit", "-m", message]))?;
        Ok(())
    }

    fn tag(&self, name: &str, message: Option<&str>) -> Result<()> {
        let annotation = message.unwrap_or(name);
        run(
            &self.runner,
            "tag",
            self.git().args(["tag", "-a", name, "-m", annotation]),
        )?;
        Ok(())
    }

    fn push(&self) -> Result<()> {
        run(&self.runner, "push", self.git().arg("push"))?;
        run(&self.runner, "push", self.git().args(["push", "--tags"]))?;
        Ok(())
    }
}

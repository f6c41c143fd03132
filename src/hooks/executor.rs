use crate::error::Result;
use crate::hooks::{Hook, HookPoint};
use crate::process::Command;
use crate::workflow::Context;
use std::path::PathBuf;

/// Runs user shell commands at a hook point.
///
/// Each non-blank line of the configured command is run in the working
/// directory with environment variables describing the release:
///
/// - `BUMPR_VERSION` - current version
/// - `BUMPR_PREVIOUS_VERSION` - version found when the run started
/// - `BUMPR_RELEASED_VERSION` - release version, once bumped
/// - `BUMPR_HOOK` - hook point name (e.g. `before_publish`)
/// - `BUMPR_PHASE` - phase name (e.g. `publish`), `rollback` for rollback hooks
/// - `BUMPR_DRY_RUN` - `1` in dry-run mode, `0` otherwise
///
/// Any non-zero exit code fails the hook.
///
/// Files the commands regenerate are declared with [`CommandHook::staging`]:
/// they are snapshotted before the commands run and queued for the next
/// commit afterwards.
pub struct CommandHook {
    name: String,
    point: HookPoint,
    command: String,
    stage: Vec<PathBuf>,
}

impl CommandHook {
    pub fn new(name: impl Into<String>, point: HookPoint, command: impl Into<String>) -> Self {
        CommandHook {
            name: name.into(),
            point,
            command: command.into(),
            stage: Vec::new(),
        }
    }

    /// Paths, relative to the working root, changed by the commands
    pub fn staging(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.stage.extend(paths);
        self
    }

    /// Environment passed to the hook commands
    pub fn env_vars(&self, ctx: &Context) -> Vec<(String, String)> {
        let mut env = vec![
            ("BUMPR_HOOK".to_string(), self.point.to_string()),
            (
                "BUMPR_PHASE".to_string(),
                self.point
                    .phase()
                    .map_or("rollback", |phase| phase.name())
                    .to_string(),
            ),
            (
                "BUMPR_DRY_RUN".to_string(),
                if ctx.is_dry_run() { "1" } else { "0" }.to_string(),
            ),
        ];

        if let Some(version) = ctx.version() {
            env.push(("BUMPR_VERSION".to_string(), version.to_string()));
        }
        if let Some(version) = ctx.original_version() {
            env.push(("BUMPR_PREVIOUS_VERSION".to_string(), version.to_string()));
        }
        if let Some(version) = ctx.released_version() {
            env.push(("BUMPR_RELEASED_VERSION".to_string(), version.to_string()));
        }

        env
    }
}

impl Hook for CommandHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &mut Context) -> Result<()> {
        for path in &self.stage {
            ctx.snapshot(path)?;
        }

        let env = self.env_vars(ctx);
        for line in Command::shell_lines(&self.command) {
            let command = env
                .iter()
                .fold(line.current_dir(ctx.root()), |cmd, (key, value)| {
                    cmd.env(key, value)
                });
            ctx.runner().run(&command)?;
        }

        for path in &self.stage {
            ctx.stage_file(path);
        }
        Ok(())
    }
}

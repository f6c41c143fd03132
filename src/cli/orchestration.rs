//! Main release orchestration logic
//!
//! Turns command-line overrides into a validated [`Config`], wires the hook
//! registry and VCS backend, and runs the [`Workflow`]. Kept apart from
//! `main.rs` so the whole flow can be driven programmatically without clap.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{load_config, Config};
use crate::domain::VersionPart;
use crate::error::Result;
use crate::hooks::{
    ChangelogHook, CommandHook, HookPoint, HookRegistry, Mode, ReadTheDocsHook, ReplaceHook,
};
use crate::process::CommandRunner;
use crate::vcs::{self, VcsKind};
use crate::workflow::{Context, Phase, ReleaseReport, Workflow};

/// Overrides collected from the command line.
///
/// `None` and `false` leave the configured value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseArgs {
    /// Path to custom config file
    pub config_path: Option<PathBuf>,
    /// Version file
    pub file: Option<PathBuf>,
    /// Working directory; defaults to the current directory
    pub root: Option<PathBuf>,

    pub part: Option<VersionPart>,
    /// Release the current numbers, only applying the suffix settings
    pub no_increment: bool,
    pub suffix: Option<String>,
    pub unsuffix: Option<bool>,
    pub prepare_part: Option<VersionPart>,
    pub prepare_suffix: Option<String>,

    pub commit: Option<bool>,
    pub tag: Option<bool>,
    pub push: Option<bool>,
    pub vcs: Option<String>,

    pub dry_run: bool,
    pub verbose: bool,
    pub skip_tests: bool,
    pub bump_only: bool,
    pub prepare_only: bool,
}

/// Apply command-line overrides on top of the loaded configuration
pub fn apply_overrides(config: &mut Config, args: &ReleaseArgs) {
    if let Some(file) = &args.file {
        config.file = Some(file.clone());
    }
    if let Some(part) = args.part {
        config.bump.part = Some(part);
    }
    if args.no_increment {
        config.bump.part = None;
    }
    if let Some(suffix) = &args.suffix {
        config.bump.suffix = Some(suffix.clone());
    }
    if let Some(unsuffix) = args.unsuffix {
        config.bump.unsuffix = unsuffix;
    }
    if let Some(part) = args.prepare_part {
        config.prepare.part = part;
    }
    if let Some(suffix) = &args.prepare_suffix {
        config.prepare.suffix = Some(suffix.clone());
    }
    if let Some(commit) = args.commit {
        config.commit = commit;
    }
    if let Some(tag) = args.tag {
        config.tag = tag;
    }
    if let Some(push) = args.push {
        config.push = push;
    }
    if let Some(vcs) = &args.vcs {
        config.vcs = vcs.clone();
    }

    config.dry_run |= args.dry_run;
    config.verbose |= args.verbose;
    config.skip_tests |= args.skip_tests;
    config.bump_only |= args.bump_only;
    config.prepare_only |= args.prepare_only;
}

/// Build the hook registry described by the configuration.
///
/// At `after_bump` and `after_prepare` the `[commands]` entries run first,
/// then the changelog, replace and Read the Docs hooks. `[[hooks]]` entries
/// follow in file order at their own points.
pub fn build_registry(config: &Config) -> Result<HookRegistry> {
    let mut registry = HookRegistry::new();
    let after_bump = HookPoint::After(Phase::Bump);
    let after_prepare = HookPoint::After(Phase::Prepare);

    if let Some(commands) = &config.commands {
        if let Some(command) = &commands.bump {
            registry.register(
                after_bump,
                CommandHook::new("commands.bump", after_bump, command)
                    .staging(commands.stage.iter().cloned()),
            );
        }
        if let Some(command) = &commands.prepare {
            registry.register(
                after_prepare,
                CommandHook::new("commands.prepare", after_prepare, command)
                    .staging(commands.stage.iter().cloned()),
            );
        }
    }

    if let Some(changelog) = &config.changelog {
        registry.register(after_bump, ChangelogHook::new(changelog.clone(), Mode::Bump));
        registry.register(
            after_prepare,
            ChangelogHook::new(changelog.clone(), Mode::Prepare),
        );
    }

    if let Some(replace) = &config.replace {
        registry.register(after_bump, ReplaceHook::new(replace.clone(), Mode::Bump));
        registry.register(after_prepare, ReplaceHook::new(replace.clone(), Mode::Prepare));
    }

    if let Some(readthedocs) = &config.readthedocs {
        registry.register(after_bump, ReadTheDocsHook::new(readthedocs.clone(), Mode::Bump));
        registry.register(
            after_prepare,
            ReadTheDocsHook::new(readthedocs.clone(), Mode::Prepare),
        );
    }

    for (index, hook) in config.hooks.iter().enumerate() {
        let point: HookPoint = hook.point.parse()?;
        let name = hook
            .name
            .clone()
            .unwrap_or_else(|| format!("hooks[{}]", index));
        registry.register(
            point,
            CommandHook::new(name, point, &hook.command).staging(hook.stage.iter().cloned()),
        );
    }

    Ok(registry)
}

/// Build the run context for a validated configuration rooted at `root`
pub fn build_context(config: Config, root: &Path) -> Result<Context> {
    let kind: VcsKind = config.vcs.parse()?;
    let runner = CommandRunner::new(config.dry_run, config.timeout_duration());
    let vcs = vcs::open(kind, root, runner.clone());
    debug!(vcs = %kind, root = %root.display(), dry_run = config.dry_run, "context ready");
    Ok(Context::new(config, root.to_path_buf(), vcs, runner))
}

/// Main release workflow
///
/// 1. Load configuration (custom path, `./bumpr.toml`, user config dir, defaults)
/// 2. Apply command-line overrides and validate
/// 3. Build hooks, VCS backend and context
/// 4. Run every enabled phase
///
/// # Returns
///
/// * `Ok(ReleaseReport)` - The release completed, possibly partially
/// * `Err` - Configuration was invalid or a phase aborted the run
pub fn run_release(args: &ReleaseArgs) -> Result<ReleaseReport> {
    let mut config = load_config(args.config_path.as_deref())?;
    apply_overrides(&mut config, args);
    config.validate()?;

    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };

    let registry = build_registry(&config)?;
    info!(hooks = registry.len(), dry_run = config.dry_run, "starting release");

    let mut ctx = build_context(config, &root)?;
    Workflow::new(registry).run(&mut ctx)
}

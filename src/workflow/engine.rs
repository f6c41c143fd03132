use super::{Context, Phase};
use crate::config::Config;
use crate::domain::Version;
use crate::error::{BumprError, CommandError, Result, EXIT_PARTIAL_SUCCESS, EXIT_SUCCESS};
use crate::files::{replace_version, VersionLocator};
use crate::hooks::{HookPoint, HookRegistry};
use crate::process::Command;
use crate::warning::ReleaseWarning;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// A post-release phase that failed after the release became durable
#[derive(Debug)]
pub struct PhaseFailure {
    pub phase: Phase,
    pub error: BumprError,
}

/// Outcome of a run that did not abort.
///
/// A run whose release commit is durable always produces a report; a failure
/// in Publish or later is carried in `failure` and turns the run into a
/// partial success.
#[derive(Debug, Default)]
pub struct ReleaseReport {
    /// Version committed and tagged as the release
    pub released: Option<Version>,
    /// Next development version, once prepared
    pub next: Option<Version>,
    /// Tag created for the release
    pub tag: Option<String>,
    /// Phases that completed, in order
    pub phases: Vec<Phase>,
    /// Phases disabled by configuration or skipped after a failure
    pub skipped: Vec<Phase>,
    pub failure: Option<PhaseFailure>,
    pub warnings: Vec<ReleaseWarning>,
    pub dry_run: bool,
}

impl ReleaseReport {
    pub fn is_partial(&self) -> bool {
        self.failure.is_some()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_partial() {
            EXIT_PARTIAL_SUCCESS
        } else {
            EXIT_SUCCESS
        }
    }
}

/// The release state machine.
///
/// Runs the [`Phase`]s in order against a [`Context`], with the hooks of the
/// registry around each phase body.
///
/// ## Failure policy
///
/// - Init to CommitTag: abort. Files written so far are restored unless the
///   release commit already succeeded.
/// - Publish and later: the failure is recorded in the report. After a
///   Publish failure the next version is still prepared when
///   `prepare_on_publish_failure` is set; any other failure skips the
///   remaining post-release phases.
/// - With `prepare_only` nothing is released, so Prepare and CommitPrepare
///   failures abort and restore the files like a release failure would.
pub struct Workflow {
    hooks: HookRegistry,
}

impl Workflow {
    pub fn new(hooks: HookRegistry) -> Self {
        Workflow { hooks }
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Whether `phase` runs under `config`
    pub fn is_enabled(phase: Phase, config: &Config) -> bool {
        match phase {
            Phase::Init | Phase::Done => true,
            Phase::Clean | Phase::Bump | Phase::CommitTag => !config.prepare_only,
            Phase::Test => !config.prepare_only && !config.skip_tests,
            Phase::Publish => !config.prepare_only && !config.bump_only,
            Phase::Prepare | Phase::CommitPrepare => !config.bump_only,
            Phase::Push => !config.bump_only && config.push,
        }
    }

    /// Execute every enabled phase.
    ///
    /// # Returns
    /// * `Ok(ReleaseReport)` - The release completed, possibly partially
    /// * `Err` - A phase up to CommitTag failed and the run was aborted
    pub fn run(&self, ctx: &mut Context) -> Result<ReleaseReport> {
        let mut report = ReleaseReport {
            dry_run: ctx.is_dry_run(),
            ..ReleaseReport::default()
        };
        let mut halted = Vec::new();
        let mut halt = false;

        for phase in Phase::ALL {
            if !Self::is_enabled(phase, ctx.config()) {
                debug!(phase = %phase, "phase disabled");
                report.skipped.push(phase);
                continue;
            }
            if halt && phase != Phase::Done {
                info!(phase = %phase, "phase skipped after failure");
                halted.push(phase);
                continue;
            }

            info!(phase = %phase, "phase started");
            match self.run_phase(phase, ctx, &mut report) {
                Ok(()) => report.phases.push(phase),
                Err(error) if Self::is_partial_failure(phase, ctx) => {
                    error!(phase = %phase, error = %error, "post-release phase failed");
                    ctx.warn(ReleaseWarning::PhaseFailed {
                        phase,
                        message: error.to_string(),
                    });
                    halt = !(phase == Phase::Publish && ctx.config().prepare_on_publish_failure);
                    if report.failure.is_none() {
                        report.failure = Some(PhaseFailure { phase, error });
                    }
                }
                Err(error) => {
                    error!(phase = %phase, error = %error, "phase failed, aborting");
                    self.abort(ctx);
                    ctx.cleanup_artifacts();
                    return Err(error);
                }
            }
        }

        if !halted.is_empty() {
            ctx.warn(ReleaseWarning::PhasesSkipped {
                phases: halted.clone(),
            });
            report.skipped.extend(halted);
        }

        ctx.cleanup_artifacts();
        report.warnings = ctx.take_warnings();
        Ok(report)
    }

    /// Whether a failure of `phase` leaves a durable result behind
    fn is_partial_failure(phase: Phase, ctx: &Context) -> bool {
        if ctx.config().prepare_only {
            return phase.is_post_release() && ctx.is_committed();
        }
        phase.is_post_release()
    }

    fn run_phase(&self, phase: Phase, ctx: &mut Context, report: &mut ReleaseReport) -> Result<()> {
        self.hooks.run(HookPoint::Before(phase), ctx)?;

        match phase {
            Phase::Init => init(ctx)?,
            Phase::Clean => {
                let commands = ctx.config().clean.clone();
                run_commands(ctx, commands.as_deref()).map_err(BumprError::CleanFailure)?
            }
            Phase::Test => {
                let commands = ctx.config().tests.clone();
                run_commands(ctx, commands.as_deref()).map_err(BumprError::TestFailure)?
            }
            Phase::Bump => {
                let released = bump(ctx)?;
                report.released = Some(released);
            }
            Phase::CommitTag => report.tag = commit_and_tag(ctx)?,
            Phase::Publish => {
                let commands = ctx.config().publish.clone();
                run_commands(ctx, commands.as_deref()).map_err(BumprError::PublishFailure)?
            }
            Phase::Prepare => {
                let next = prepare(ctx)?;
                report.next = Some(next);
            }
            Phase::CommitPrepare => commit_prepare(ctx)?,
            Phase::Push => push(ctx)?,
            Phase::Done => {}
        }

        self.hooks.run(HookPoint::After(phase), ctx)
    }

    /// Restore the files written by a failed run, unless a commit made them durable
    fn abort(&self, ctx: &mut Context) {
        if ctx.is_committed() {
            warn!("release commit exists, files are left as committed");
            return;
        }
        if ctx.snapshots().is_empty() {
            return;
        }

        info!(files = ctx.snapshots().len(), "rolling back");
        if let Err(e) = self.hooks.run(HookPoint::Rollback, ctx) {
            let (hook, message) = match &e {
                BumprError::Hook { hook, source, .. } => (hook.clone(), source.to_string()),
                other => (String::new(), other.to_string()),
            };
            ctx.warn(ReleaseWarning::RollbackHookFailed { hook, message });
        }
        if let Err(e) = ctx.rollback() {
            error!(error = %e, "rollback incomplete");
        }
    }
}

fn init(ctx: &mut Context) -> Result<()> {
    let file = ctx.config().version_file()?.to_path_buf();
    let locator = VersionLocator::new(&ctx.config().regex)?;
    let found = locator.find(&ctx.read_file(&file)?)?;
    info!(version = %found.version, file = %file.display(), "current version");
    ctx.load_version(found.version, &found.raw);

    if !ctx.vcs().is_clean()? {
        return Err(BumprError::DirtyRepo);
    }
    Ok(())
}

fn run_commands(ctx: &Context, commands: Option<&str>) -> std::result::Result<(), CommandError> {
    let Some(text) = commands else {
        debug!("no command configured");
        return Ok(());
    };
    let commands: Vec<Command> = Command::shell_lines(text)
        .into_iter()
        .map(|command| command.current_dir(ctx.root()))
        .collect();
    ctx.runner().run_all(&commands)
}

fn bump(ctx: &mut Context) -> Result<Version> {
    let settings = ctx.config().bump.clone();
    let current = ctx.require_version()?.clone();

    let mut released = match settings.part {
        Some(part) => current.bump(part, settings.unsuffix)?,
        None if settings.unsuffix => current.with_suffix(None, None)?,
        None => current.clone(),
    };
    if let Some(suffix) = settings.suffix.as_deref().filter(|s| !s.is_empty()) {
        released = released.with_suffix(Some(suffix), None)?;
    }

    info!(from = %current, to = %released, "bumping release version");
    substitute(ctx, &released)?;
    ctx.set_released(released.clone());
    Ok(released)
}

fn prepare(ctx: &mut Context) -> Result<Version> {
    let settings = ctx.config().prepare.clone();
    let current = ctx.require_version()?.clone();

    let next = current
        .bump(settings.part, true)?
        .with_suffix(settings.effective_suffix(), None)?;

    info!(from = %current, to = %next, "preparing next version");
    substitute(ctx, &next)?;
    Ok(next)
}

/// Write `version` into the main file and every additional file
fn substitute(ctx: &mut Context, version: &Version) -> Result<()> {
    let new_text = version.to_string();
    let old_text = ctx
        .version_text()
        .map(str::to_string)
        .ok_or_else(|| BumprError::format("No version loaded"))?;
    let file = ctx.config().version_file()?.to_path_buf();
    let extra_files = ctx.config().files.clone();
    let locator = VersionLocator::new(&ctx.config().regex)?;

    let updated = locator.replace(&ctx.read_file(&file)?, &new_text)?;
    ctx.write_file(&file, &updated)?;

    for path in extra_files {
        let content = ctx.read_file(&path)?;
        match replace_version(&content, &old_text, &new_text)? {
            Some(updated) => ctx.write_file(&path, &updated)?,
            None => ctx.warn(ReleaseWarning::VersionNotFound {
                path,
                version: old_text.clone(),
            }),
        }
    }

    ctx.set_version(version.clone(), &new_text);
    Ok(())
}

fn commit_and_tag(ctx: &mut Context) -> Result<Option<String>> {
    if !ctx.config().commit {
        ctx.take_staged();
        ctx.warn(ReleaseWarning::CommitDisabled {
            phase: Phase::CommitTag,
        });
        return Ok(None);
    }

    // Render everything first so a template error cannot leave a commit without its tag.
    let message = ctx.render(&ctx.config().bump.message)?;
    let tag = if ctx.config().tag {
        let name = ctx.render(&ctx.config().tag_format)?;
        let annotation = ctx
            .config()
            .tag_message
            .as_deref()
            .map(|template| ctx.render(template))
            .transpose()?;
        Some((name, annotation))
    } else {
        None
    };

    commit(ctx, &message)?;

    match tag {
        Some((name, annotation)) => {
            if ctx.is_dry_run() {
                info!(tag = %name, "[dry-run] would tag");
            } else {
                ctx.vcs().tag(&name, annotation.as_deref())?;
                info!(tag = %name, "tagged release");
            }
            Ok(Some(name))
        }
        None => {
            ctx.warn(ReleaseWarning::TagDisabled);
            Ok(None)
        }
    }
}

fn commit_prepare(ctx: &mut Context) -> Result<()> {
    if !ctx.config().commit {
        ctx.take_staged();
        ctx.warn(ReleaseWarning::CommitDisabled {
            phase: Phase::CommitPrepare,
        });
        return Ok(());
    }

    let message = ctx.render(&ctx.config().prepare.message)?;
    commit(ctx, &message)
}

/// Stage the queued files and commit them
fn commit(ctx: &mut Context, message: &str) -> Result<()> {
    let staged: Vec<PathBuf> = ctx
        .take_staged()
        .into_iter()
        .map(|path| relative_to(ctx.root(), path))
        .collect();

    if ctx.is_dry_run() {
        info!(files = ?staged, message, "[dry-run] would commit");
        return Ok(());
    }

    ctx.vcs().stage(&staged)?;
    ctx.vcs().commit(message)?;
    ctx.mark_committed();
    info!(vcs = ctx.vcs().name(), message, "committed");
    Ok(())
}

fn push(ctx: &mut Context) -> Result<()> {
    if ctx.is_dry_run() {
        info!("[dry-run] would push");
        return Ok(());
    }
    ctx.vcs().push()?;
    info!(vcs = ctx.vcs().name(), "pushed");
    Ok(())
}

fn relative_to(root: &Path, path: PathBuf) -> PathBuf {
    if let Ok(relative) = path.strip_prefix(root) {
        return relative.to_path_buf();
    }
    path
}

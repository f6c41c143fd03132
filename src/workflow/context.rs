use crate::config::Config;
use crate::domain::{render, TemplateVars, Version};
use crate::error::{BumprError, Result};
use crate::process::CommandRunner;
use crate::vcs::Vcs;
use crate::warning::ReleaseWarning;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Content of a file before the run first wrote it.
///
/// `original` is `None` when the file did not exist, in which case rollback
/// deletes it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSnapshot {
    pub path: PathBuf,
    pub original: Option<Vec<u8>>,
}

/// Mutable state of one release run.
///
/// Built once by the caller and handed to the workflow engine and every hook
/// as `&mut Context`. All file writes go through [`Context::write_file`],
/// which records a snapshot before the first write of each path so a failed
/// run can restore it byte for byte.
pub struct Context {
    config: Config,
    root: PathBuf,
    vcs: Box<dyn Vcs>,
    runner: CommandRunner,
    now: DateTime<Local>,

    version: Option<Version>,
    original_version: Option<Version>,
    released_version: Option<Version>,
    version_text: Option<String>,

    snapshots: Vec<FileSnapshot>,
    overlay: HashMap<PathBuf, String>,
    staged: Vec<PathBuf>,
    artifacts: Vec<PathBuf>,
    committed: bool,
    warnings: Vec<ReleaseWarning>,
}

impl Context {
    pub fn new(config: Config, root: PathBuf, vcs: Box<dyn Vcs>, runner: CommandRunner) -> Self {
        Context {
            config,
            root,
            vcs,
            runner,
            now: Local::now(),
            version: None,
            original_version: None,
            released_version: None,
            version_text: None,
            snapshots: Vec::new(),
            overlay: HashMap::new(),
            staged: Vec::new(),
            artifacts: Vec::new(),
            committed: false,
            warnings: Vec::new(),
        }
    }

    /// Pin the timestamp used for `{date}` placeholders
    pub fn with_date(mut self, now: DateTime<Local>) -> Self {
        self.now = now;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vcs(&self) -> &dyn Vcs {
        self.vcs.as_ref()
    }

    pub fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    pub fn is_dry_run(&self) -> bool {
        self.runner.is_dry_run()
    }

    pub fn date(&self) -> DateTime<Local> {
        self.now
    }

    /// Resolve `path` against the working root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Read a file, observing content planned earlier in a dry run.
    pub fn read_file(&self, path: &Path) -> Result<String> {
        let path = self.resolve(path);
        if let Some(content) = self.overlay.get(&path) {
            return Ok(content.clone());
        }
        fs::read_to_string(&path).map_err(|e| BumprError::file(&path, e))
    }

    /// Write a file and queue it for staging.
    ///
    /// The original content is snapshotted before the first write of each
    /// path. In dry-run mode the content is kept in memory only.
    pub fn write_file(&mut self, path: &Path, content: &str) -> Result<()> {
        let path = self.resolve(path);
        self.snapshot(&path)?;

        if self.is_dry_run() {
            info!(path = %path.display(), "[dry-run] would write");
            self.overlay.insert(path.clone(), content.to_string());
        } else {
            debug!(path = %path.display(), "writing");
            fs::write(&path, content).map_err(|e| BumprError::file(&path, e))?;
        }

        self.stage_file(path);
        Ok(())
    }

    /// Record the current content of `path` for rollback, once per path.
    ///
    /// Files changed outside of [`Context::write_file`] (by hook commands)
    /// must be snapshotted before they are touched.
    pub fn snapshot(&mut self, path: &Path) -> Result<()> {
        let path = self.resolve(path);
        if self.snapshots.iter().any(|s| s.path == path) {
            return Ok(());
        }

        let original = match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(BumprError::file(&path, e)),
        };
        self.snapshots.push(FileSnapshot { path, original });
        Ok(())
    }

    /// Queue a path for the next commit
    pub fn stage_file(&mut self, path: impl AsRef<Path>) {
        let path = self.resolve(path.as_ref());
        if !self.staged.contains(&path) {
            self.staged.push(path);
        }
    }

    /// Paths queued for staging, clearing the queue
    pub fn take_staged(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.staged)
    }

    /// Register a generated file or directory removed at the end of the run
    pub fn track_artifact(&mut self, path: impl AsRef<Path>) {
        let path = self.resolve(path.as_ref());
        self.artifacts.push(path);
    }

    /// Remove tracked artifacts. Failures are logged only.
    pub fn cleanup_artifacts(&mut self) {
        for path in std::mem::take(&mut self.artifacts) {
            if self.is_dry_run() {
                info!(path = %path.display(), "[dry-run] would remove artifact");
                continue;
            }
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else if path.exists() {
                fs::remove_file(&path)
            } else {
                Ok(())
            };
            match removed {
                Ok(()) => debug!(path = %path.display(), "removed artifact"),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove artifact"),
            }
        }
    }

    /// Record the version found in the main file at Init
    pub fn load_version(&mut self, version: Version, raw: &str) {
        self.original_version = Some(version.clone());
        self.version = Some(version);
        self.version_text = Some(raw.to_string());
    }

    /// Record the version now written in the files
    pub fn set_version(&mut self, version: Version, text: &str) {
        self.version = Some(version);
        self.version_text = Some(text.to_string());
    }

    pub fn set_released(&mut self, version: Version) {
        self.released_version = Some(version);
    }

    /// Current version, once loaded
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Current version, or a format error before Init loaded it
    pub fn require_version(&self) -> Result<&Version> {
        self.version
            .as_ref()
            .ok_or_else(|| BumprError::format("No version loaded"))
    }

    pub fn original_version(&self) -> Option<&Version> {
        self.original_version.as_ref()
    }

    pub fn released_version(&self) -> Option<&Version> {
        self.released_version.as_ref()
    }

    /// The version exactly as currently written in the files
    pub fn version_text(&self) -> Option<&str> {
        self.version_text.as_deref()
    }

    /// Render a template with the current version and run date
    pub fn render(&self, template: &str) -> Result<String> {
        let version = self.require_version()?.to_string();
        render(template, &TemplateVars::new(&version, self.now))
    }

    /// Render a template for a specific version
    pub fn render_with(&self, template: &str, version: &Version) -> Result<String> {
        let version = version.to_string();
        render(template, &TemplateVars::new(&version, self.now))
    }

    pub fn snapshots(&self) -> &[FileSnapshot] {
        &self.snapshots
    }

    /// Restore every written file to its recorded original, newest first.
    ///
    /// Every snapshot is attempted; the first failure is returned.
    pub fn rollback(&mut self) -> Result<()> {
        let snapshots = std::mem::take(&mut self.snapshots);
        self.overlay.clear();
        self.staged.clear();
        let mut first_error = None;

        for snapshot in snapshots.iter().rev() {
            if self.is_dry_run() {
                info!(path = %snapshot.path.display(), "[dry-run] would restore");
                continue;
            }

            let restored = match &snapshot.original {
                Some(bytes) => fs::write(&snapshot.path, bytes),
                None => match fs::remove_file(&snapshot.path) {
                    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                    other => other,
                },
            };

            match restored {
                Ok(()) => info!(path = %snapshot.path.display(), "restored"),
                Err(e) => {
                    warn!(path = %snapshot.path.display(), error = %e, "failed to restore");
                    if first_error.is_none() {
                        first_error = Some(BumprError::file(&snapshot.path, e));
                    }
                }
            }
        }

        if let Some(original) = self.original_version.clone() {
            self.version = Some(original);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Record that a commit succeeded; rollback no longer applies
    pub fn mark_committed(&mut self) {
        self.committed = true;
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn warn(&mut self, warning: ReleaseWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[ReleaseWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<ReleaseWarning> {
        std::mem::take(&mut self.warnings)
    }
}

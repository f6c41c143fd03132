//! Hooks configured from the `[changelog]`, `[replace]` and `[readthedocs]` sections.

use crate::config::{ChangelogConfig, ReadTheDocsConfig, ReplaceConfig};
use crate::domain::Version;
use crate::error::{BumprError, Result};
use crate::files::{replace_all, replace_version};
use crate::hooks::Hook;
use crate::workflow::Context;
use std::path::PathBuf;
use tracing::{debug, info};

/// Which half of the release a built-in hook is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Runs after the release version is written
    Bump,
    /// Runs after the next development version is written
    Prepare,
}

/// Maintains an underlined-section changelog.
///
/// ```text
/// Current
/// -------
///
/// - Nothing yet
/// ```
///
/// In [`Mode::Bump`] the `prepare` header is renamed to the rendered `bump`
/// header. In [`Mode::Prepare`] a fresh `prepare` section is inserted above
/// the first section.
pub struct ChangelogHook {
    settings: ChangelogConfig,
    mode: Mode,
}

impl ChangelogHook {
    pub fn new(settings: ChangelogConfig, mode: Mode) -> Self {
        ChangelogHook { settings, mode }
    }

    fn separator(&self) -> char {
        self.settings.separator.chars().next().unwrap_or('-')
    }

    fn is_underline(&self, line: &str) -> bool {
        let line = line.trim_end();
        !line.is_empty() && line.chars().all(|c| c == self.separator())
    }

    fn underline(&self, header: &str) -> String {
        self.separator()
            .to_string()
            .repeat(header.chars().count())
    }

    /// Index of the first header line, i.e. a non-blank line followed by an underline
    fn first_section(&self, lines: &[String]) -> Option<usize> {
        lines.windows(2).position(|pair| {
            !pair[0].trim().is_empty() && !self.is_underline(&pair[0]) && self.is_underline(&pair[1])
        })
    }

    fn release_section(&self, ctx: &Context, lines: &mut [String]) -> Result<()> {
        let previous = ctx.original_version().or(ctx.version()).cloned();
        let current_header = match &previous {
            Some(version) => ctx.render_with(&self.settings.prepare, version)?,
            None => ctx.render(&self.settings.prepare)?,
        };
        let header = ctx.render(&self.settings.bump)?;

        let index = lines
            .windows(2)
            .position(|pair| pair[0].trim() == current_header && self.is_underline(&pair[1]))
            .ok_or_else(|| {
                BumprError::template(format!(
                    "Changelog header '{}' not found in {}",
                    current_header,
                    self.settings.file.display()
                ))
            })?;

        debug!(from = %current_header, to = %header, "renaming changelog section");
        lines[index + 1] = self.underline(&header);
        lines[index] = header;
        Ok(())
    }

    fn open_section(&self, ctx: &Context, lines: &mut Vec<String>) -> Result<()> {
        let header = ctx.render(&self.settings.prepare)?;
        let section = vec![
            self.underline(&header),
            String::new(),
            format!("- {}", self.settings.empty),
            String::new(),
        ];

        match self.first_section(lines) {
            Some(index) => {
                let tail = lines.split_off(index);
                lines.push(header);
                lines.extend(section);
                lines.extend(tail);
            }
            None => {
                if lines.last().is_some_and(|line| !line.trim().is_empty()) {
                    lines.push(String::new());
                }
                lines.push(header);
                lines.extend(section);
            }
        }
        Ok(())
    }
}

impl Hook for ChangelogHook {
    fn name(&self) -> &str {
        "changelog"
    }

    fn run(&self, ctx: &mut Context) -> Result<()> {
        let path = self.settings.file.clone();
        let content = ctx.read_file(&path)?;
        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

        match self.mode {
            Mode::Bump => self.release_section(ctx, &mut lines)?,
            Mode::Prepare => self.open_section(ctx, &mut lines)?,
        }

        let mut updated = lines.join("\n");
        if content.ends_with('\n') {
            updated.push('\n');
        }
        info!(file = %path.display(), "updating changelog");
        ctx.write_file(&path, &updated)
    }
}

/// Swaps a development marker for the release string and back.
///
/// With the defaults, documentation links pointing at `latest` are pinned to
/// the released version at bump time and restored at prepare time.
pub struct ReplaceHook {
    settings: ReplaceConfig,
    mode: Mode,
}

impl ReplaceHook {
    pub fn new(settings: ReplaceConfig, mode: Mode) -> Self {
        ReplaceHook { settings, mode }
    }

}

/// Main version file followed by the additional `files`
fn targets(ctx: &Context) -> Result<Vec<PathBuf>> {
    let mut targets = vec![ctx.config().version_file()?.to_path_buf()];
    targets.extend(ctx.config().files.iter().cloned());
    Ok(targets)
}

/// Version the release was tagged with, for hooks running at prepare time
fn released(ctx: &Context) -> Result<Version> {
    ctx.released_version()
        .or(ctx.original_version())
        .cloned()
        .ok_or_else(|| BumprError::format("No released version to replace"))
}

impl Hook for ReplaceHook {
    fn name(&self) -> &str {
        "replace"
    }

    fn run(&self, ctx: &mut Context) -> Result<()> {
        let (from, to) = match self.mode {
            Mode::Bump => (self.settings.dev.clone(), ctx.render(&self.settings.stable)?),
            Mode::Prepare => (
                ctx.render_with(&self.settings.stable, &released(ctx)?)?,
                self.settings.dev.clone(),
            ),
        };

        for path in targets(ctx)? {
            let content = ctx.read_file(&path)?;
            if let Some(updated) = replace_all(&content, &from, &to) {
                debug!(file = %path.display(), from = %from, to = %to, "replacing");
                ctx.write_file(&path, &updated)?;
            }
        }
        Ok(())
    }
}

/// Pins Read the Docs links to the release and points them back at the
/// development docs afterwards.
///
/// Only the configured documentation URL and badge are rewritten, so other
/// occurrences of `latest` are left alone.
pub struct ReadTheDocsHook {
    settings: ReadTheDocsConfig,
    mode: Mode,
}

impl ReadTheDocsHook {
    pub fn new(settings: ReadTheDocsConfig, mode: Mode) -> Self {
        ReadTheDocsHook { settings, mode }
    }
}

impl Hook for ReadTheDocsHook {
    fn name(&self) -> &str {
        "readthedocs"
    }

    fn run(&self, ctx: &mut Context) -> Result<()> {
        let dev = self.settings.links(&self.settings.prepare);
        let (from, to) = match self.mode {
            Mode::Bump => (dev, self.settings.links(&ctx.render(&self.settings.bump)?)),
            Mode::Prepare => {
                let tag = ctx.render_with(&self.settings.bump, &released(ctx)?)?;
                (self.settings.links(&tag), dev)
            }
        };

        for path in targets(ctx)? {
            let original = ctx.read_file(&path)?;
            let mut content = original.clone();
            for (old, new) in from.iter().zip(&to) {
                if let Some(updated) = replace_version(&content, old, new)? {
                    content = updated;
                }
            }
            if content != original {
                debug!(file = %path.display(), "updating documentation links");
                ctx.write_file(&path, &content)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::process::CommandRunner;
    use crate::vcs::MockVcs;
    use chrono::{Local, TimeZone};
    use std::fs;
    use std::path::Path;

    const CHANGELOG: &str = "Changelog\n=========\n\nCurrent\n-------\n\n- Fix things\n\n1.0.0 (2024-01-01)\n------------------\n\n- Initial release\n";

    fn changelog_settings() -> ChangelogConfig {
        ChangelogConfig {
            file: PathBuf::from("CHANGELOG.rst"),
            separator: "-".to_string(),
            bump: "{version} ({date:%Y-%m-%d})".to_string(),
            prepare: "Current".to_string(),
            empty: "Nothing yet".to_string(),
        }
    }

    fn context(dir: &Path) -> Context {
        let config = Config {
            file: Some(PathBuf::from("setup.py")),
            files: vec![PathBuf::from("README.rst")],
            ..Config::default()
        };
        Context::new(
            config,
            dir.to_path_buf(),
            Box::new(MockVcs::new()),
            CommandRunner::default(),
        )
        .with_date(Local.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_changelog_bump_renames_current_section() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("CHANGELOG.rst"), CHANGELOG).unwrap();
        let mut ctx = context(dir.path());
        ctx.load_version(Version::parse("1.0.1dev").unwrap(), "1.0.1dev");
        ctx.set_version(Version::new(1, 0, 1), "1.0.1");

        ChangelogHook::new(changelog_settings(), Mode::Bump)
            .run(&mut ctx)
            .unwrap();

        let content = fs::read_to_string(dir.path().join("CHANGELOG.rst")).unwrap();
        assert!(content.contains("\n1.0.1 (2024-03-09)\n------------------\n\n- Fix things\n"));
        assert!(!content.contains("Current"));
        assert!(content.ends_with("- Initial release\n"));
        assert_eq!(ctx.take_staged(), vec![dir.path().join("CHANGELOG.rst")]);
    }

    #[test]
    fn test_changelog_bump_without_header_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("CHANGELOG.rst"), "Changelog\n=========\n").unwrap();
        let mut ctx = context(dir.path());
        ctx.load_version(Version::new(1, 0, 0), "1.0.0");

        let err = ChangelogHook::new(changelog_settings(), Mode::Bump)
            .run(&mut ctx)
            .unwrap_err();
        assert!(matches!(err, BumprError::Template(_)));
    }

    #[test]
    fn test_changelog_prepare_inserts_section_above_first() {
        let dir = tempfile::tempdir().unwrap();
        let released = "Changelog\n=========\n\n1.0.1 (2024-03-09)\n------------------\n\n- Fix things\n";
        fs::write(dir.path().join("CHANGELOG.rst"), released).unwrap();
        let mut ctx = context(dir.path());
        ctx.load_version(Version::parse("1.0.2dev").unwrap(), "1.0.2dev");

        ChangelogHook::new(changelog_settings(), Mode::Prepare)
            .run(&mut ctx)
            .unwrap();

        let content = fs::read_to_string(dir.path().join("CHANGELOG.rst")).unwrap();
        assert_eq!(
            content,
            "Changelog\n=========\n\nCurrent\n-------\n\n- Nothing yet\n\n1.0.1 (2024-03-09)\n------------------\n\n- Fix things\n"
        );
    }

    #[test]
    fn test_replace_pins_and_restores_marker() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("setup.py"), "version = '1.0.1'\n").unwrap();
        fs::write(
            dir.path().join("README.rst"),
            "https://docs.example.com/en/latest/\n",
        )
        .unwrap();
        let mut ctx = context(dir.path());
        ctx.load_version(Version::new(1, 0, 1), "1.0.1");
        ctx.set_released(Version::new(1, 0, 1));

        let settings = ReplaceConfig {
            dev: "latest".to_string(),
            stable: "{version}".to_string(),
        };
        ReplaceHook::new(settings.clone(), Mode::Bump)
            .run(&mut ctx)
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("README.rst")).unwrap(),
            "https://docs.example.com/en/1.0.1/\n"
        );

        ctx.set_version(Version::parse("1.0.2dev").unwrap(), "1.0.2dev");
        ReplaceHook::new(settings, Mode::Prepare)
            .run(&mut ctx)
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("README.rst")).unwrap(),
            "https://docs.example.com/en/latest/\n"
        );
    }

    #[test]
    fn test_readthedocs_only_touches_doc_links() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("setup.py"), "version = '1.0.1'\n").unwrap();
        let readme = "Docs: https://bumpr.readthedocs.io/en/latest\n\
![docs](https://readthedocs.org/projects/bumpr/badge/?version=latest)\n\
Install the latest release.\n";
        fs::write(dir.path().join("README.rst"), readme).unwrap();
        let mut ctx = context(dir.path());
        ctx.load_version(Version::new(1, 0, 1), "1.0.1");
        ctx.set_released(Version::new(1, 0, 1));

        let settings = ReadTheDocsConfig {
            id: "bumpr".to_string(),
            url: "https://{id}.readthedocs.io/en/{tag}".to_string(),
            badge: "https://readthedocs.org/projects/{id}/badge/?version={tag}".to_string(),
            bump: "{version}".to_string(),
            prepare: "latest".to_string(),
        };
        ReadTheDocsHook::new(settings.clone(), Mode::Bump)
            .run(&mut ctx)
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("README.rst")).unwrap(),
            "Docs: https://bumpr.readthedocs.io/en/1.0.1\n\
![docs](https://readthedocs.org/projects/bumpr/badge/?version=1.0.1)\n\
Install the latest release.\n"
        );
        assert_eq!(ctx.take_staged(), vec![dir.path().join("README.rst")]);

        ctx.set_version(Version::parse("1.0.2dev").unwrap(), "1.0.2dev");
        ReadTheDocsHook::new(settings, Mode::Prepare)
            .run(&mut ctx)
            .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("README.rst")).unwrap(),
            readme
        );
    }
}

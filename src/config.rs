use crate::domain::VersionPart;
use crate::error::{BumprError, Result};
use crate::files::VersionLocator;
use crate::hooks::HookPoint;
use crate::vcs::VcsKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the working directory and the user config directory
pub const CONFIG_FILE_NAME: &str = "bumpr.toml";

/// Default pattern locating the version in the main file
pub const DEFAULT_VERSION_REGEX: &str =
    r#"(?:__version__|VERSION|version)\s*=\s*['"](?P<version>[^'"]+)['"]"#;

/// Represents the complete configuration for bumpr.
///
/// Read-only once loaded and overridden by command-line flags; the workflow
/// engine never parses configuration itself.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// File holding the version string
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Additional files where the version is substituted
    #[serde(default)]
    pub files: Vec<PathBuf>,

    #[serde(default = "default_regex")]
    pub regex: String,

    #[serde(default = "default_vcs")]
    pub vcs: String,

    #[serde(default = "default_true")]
    pub commit: bool,

    #[serde(default = "default_true")]
    pub tag: bool,

    #[serde(default = "default_tag_format")]
    pub tag_format: String,

    #[serde(default)]
    pub tag_message: Option<String>,

    #[serde(default)]
    pub push: bool,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub skip_tests: bool,

    #[serde(default)]
    pub bump_only: bool,

    #[serde(default)]
    pub prepare_only: bool,

    /// Clean commands, one per line
    #[serde(default)]
    pub clean: Option<String>,

    /// Test commands, one per line
    #[serde(default)]
    pub tests: Option<String>,

    /// Publish commands, one per line
    #[serde(default)]
    pub publish: Option<String>,

    /// Hard limit in seconds for every external command
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Whether the next development version is still prepared after a failed publish
    #[serde(default = "default_true")]
    pub prepare_on_publish_failure: bool,

    #[serde(default)]
    pub bump: BumpConfig,

    #[serde(default)]
    pub prepare: PrepareConfig,

    #[serde(default)]
    pub changelog: Option<ChangelogConfig>,

    #[serde(default)]
    pub replace: Option<ReplaceConfig>,

    #[serde(default)]
    pub readthedocs: Option<ReadTheDocsConfig>,

    #[serde(default)]
    pub commands: Option<CommandsConfig>,

    #[serde(default)]
    pub hooks: Vec<HookConfig>,
}

fn default_true() -> bool {
    true
}

fn default_regex() -> String {
    DEFAULT_VERSION_REGEX.to_string()
}

fn default_vcs() -> String {
    "git".to_string()
}

fn default_tag_format() -> String {
    "{version}".to_string()
}

fn default_part() -> VersionPart {
    VersionPart::Patch
}

fn default_bump_part() -> Option<VersionPart> {
    Some(VersionPart::Patch)
}

/// `part = "none"` in `[bump]`: release without incrementing
const NO_PART: &str = "none";

mod bump_part {
    use super::NO_PART;
    use crate::domain::VersionPart;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(part: &Option<VersionPart>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(part.as_ref().map_or(NO_PART, VersionPart::name))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<VersionPart>, D::Error> {
        let text = String::deserialize(d)?;
        if text.eq_ignore_ascii_case(NO_PART) {
            return Ok(None);
        }
        text.parse().map(Some).map_err(de::Error::custom)
    }
}

fn default_bump_message() -> String {
    "Bump version {version}".to_string()
}

fn default_prepare_message() -> String {
    "Prepare version {version} for next release".to_string()
}

fn default_prepare_suffix() -> Option<String> {
    Some("dev".to_string())
}

/// Settings of the release bump.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BumpConfig {
    /// Component incremented for the release; `None` keeps the numbers and
    /// only applies the suffix settings (`1.0.2dev` releases as `1.0.2`)
    #[serde(default = "default_bump_part", with = "bump_part")]
    pub part: Option<VersionPart>,

    /// Suffix of the release version (e.g. `rc1`)
    #[serde(default)]
    pub suffix: Option<String>,

    /// Drop any development suffix from the released version
    #[serde(default = "default_true")]
    pub unsuffix: bool,

    #[serde(default = "default_bump_message")]
    pub message: String,
}

impl Default for BumpConfig {
    fn default() -> Self {
        BumpConfig {
            part: default_bump_part(),
            suffix: None,
            unsuffix: true,
            message: default_bump_message(),
        }
    }
}

/// Settings of the next development version.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PrepareConfig {
    #[serde(default = "default_part")]
    pub part: VersionPart,

    /// Development suffix; an empty string disables it
    #[serde(default = "default_prepare_suffix")]
    pub suffix: Option<String>,

    #[serde(default = "default_prepare_message")]
    pub message: String,
}

impl PrepareConfig {
    /// The suffix to apply, treating an empty string as no suffix
    pub fn effective_suffix(&self) -> Option<&str> {
        self.suffix.as_deref().filter(|s| !s.is_empty())
    }
}

impl Default for PrepareConfig {
    fn default() -> Self {
        PrepareConfig {
            part: default_part(),
            suffix: default_prepare_suffix(),
            message: default_prepare_message(),
        }
    }
}

fn default_separator() -> String {
    "-".to_string()
}

fn default_changelog_bump() -> String {
    "{version} ({date:%Y-%m-%d})".to_string()
}

fn default_changelog_prepare() -> String {
    "Current".to_string()
}

fn default_changelog_empty() -> String {
    "Nothing yet".to_string()
}

/// Changelog maintenance: headers rewritten at bump, new section at prepare.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChangelogConfig {
    pub file: PathBuf,

    /// Character used to underline section headers
    #[serde(default = "default_separator")]
    pub separator: String,

    #[serde(default = "default_changelog_bump")]
    pub bump: String,

    #[serde(default = "default_changelog_prepare")]
    pub prepare: String,

    #[serde(default = "default_changelog_empty")]
    pub empty: String,
}

fn default_replace_dev() -> String {
    "latest".to_string()
}

fn default_replace_stable() -> String {
    "{version}".to_string()
}

/// Swap a development marker (e.g. documentation links on `latest`) for the release.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReplaceConfig {
    #[serde(default = "default_replace_dev")]
    pub dev: String,

    #[serde(default = "default_replace_stable")]
    pub stable: String,
}

fn default_rtd_url() -> String {
    "https://{id}.readthedocs.io/en/{tag}".to_string()
}

fn default_rtd_badge() -> String {
    "https://readthedocs.org/projects/{id}/badge/?version={tag}".to_string()
}

fn default_rtd_bump() -> String {
    "{version}".to_string()
}

fn default_rtd_prepare() -> String {
    "latest".to_string()
}

/// Read the Docs links pinned to the release, then back to the development docs.
///
/// `url` and `badge` take `{id}` and `{tag}`; `bump` is the release tag
/// template and `prepare` the development tag.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReadTheDocsConfig {
    pub id: String,

    #[serde(default = "default_rtd_url")]
    pub url: String,

    #[serde(default = "default_rtd_badge")]
    pub badge: String,

    #[serde(default = "default_rtd_bump")]
    pub bump: String,

    #[serde(default = "default_rtd_prepare")]
    pub prepare: String,
}

impl ReadTheDocsConfig {
    /// Documentation URL and badge for `tag`
    pub fn links(&self, tag: &str) -> [String; 2] {
        [&self.url, &self.badge].map(|template| {
            template.replace("{id}", &self.id).replace("{tag}", tag)
        })
    }
}

/// Extra commands run right after the version files are rewritten.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct CommandsConfig {
    #[serde(default)]
    pub bump: Option<String>,

    #[serde(default)]
    pub prepare: Option<String>,

    /// Files regenerated by the commands, committed with the version files
    #[serde(default)]
    pub stage: Vec<PathBuf>,
}

/// A user shell command attached to a hook point such as `before_publish`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HookConfig {
    pub point: String,
    pub command: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Files changed by the command that belong in the next commit
    #[serde(default)]
    pub stage: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            file: None,
            files: Vec::new(),
            regex: default_regex(),
            vcs: default_vcs(),
            commit: true,
            tag: true,
            tag_format: default_tag_format(),
            tag_message: None,
            push: false,
            dry_run: false,
            verbose: false,
            skip_tests: false,
            bump_only: false,
            prepare_only: false,
            clean: None,
            tests: None,
            publish: None,
            timeout: None,
            prepare_on_publish_failure: true,
            bump: BumpConfig::default(),
            prepare: PrepareConfig::default(),
            changelog: None,
            replace: None,
            readthedocs: None,
            commands: None,
            hooks: Vec::new(),
        }
    }
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| BumprError::config(format!("Invalid TOML: {}", e)))
    }

    /// Timeout applied to external commands, if configured
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// Main version file, or a configuration error when missing
    pub fn version_file(&self) -> Result<&Path> {
        self.file
            .as_deref()
            .ok_or_else(|| BumprError::config("No version file configured (`file`)"))
    }

    /// Check the settings that cannot be expressed by the TOML schema.
    pub fn validate(&self) -> Result<()> {
        self.version_file()?;

        if self.bump_only && self.prepare_only {
            return Err(BumprError::config(
                "`bump_only` and `prepare_only` are mutually exclusive",
            ));
        }

        if self.timeout == Some(0) {
            return Err(BumprError::config("`timeout` must be at least 1 second"));
        }

        VersionLocator::new(&self.regex)?;
        self.vcs.parse::<VcsKind>()?;

        for hook in &self.hooks {
            hook.point.parse::<HookPoint>()?;
        }

        if self
            .readthedocs
            .as_ref()
            .is_some_and(|rtd| rtd.id.trim().is_empty())
        {
            return Err(BumprError::config("`readthedocs.id` must not be empty"));
        }

        if let Some(changelog) = &self.changelog {
            if changelog.separator.chars().count() != 1 {
                return Err(BumprError::config(
                    "`changelog.separator` must be a single character",
                ));
            }
        }

        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `bumpr.toml` in current directory
/// 3. `bumpr.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed, or the custom path is missing
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let candidate = if let Some(path) = config_path {
        Some(path.to_path_buf())
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        Some(PathBuf::from(CONFIG_FILE_NAME))
    } else {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    };

    let Some(path) = candidate else {
        return Ok(Config::default());
    };

    tracing::debug!(path = %path.display(), "loading configuration");
    let text = fs::read_to_string(&path).map_err(|e| BumprError::file(&path, e))?;
    Config::from_toml(&text)
        .map_err(|e| BumprError::config(format!("{}: {}", path.display(), e)))
}

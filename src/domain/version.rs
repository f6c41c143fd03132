use crate::error::{BumprError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Grammar accepted by [`Version::parse`].
///
/// `MAJOR.MINOR.PATCH`, then an optional `-` or `.` separator and a suffix
/// made of a letter-led identifier whose trailing digits form the serial.
const VERSION_PATTERN: &str =
    r"^(\d+)\.(\d+)\.(\d+)(?:[-.]?([A-Za-z][A-Za-z0-9]*?)(\d*))?$";

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VERSION_PATTERN).expect("version grammar is a valid regex"))
}

/// Release version: `major.minor.patch` with an optional prerelease suffix.
///
/// The canonical rendering concatenates the suffix and its serial number
/// directly after the patch component, without any separator:
/// `1.2.0`, `1.2.0dev`, `1.2.0dev3`, `2.0.0rc4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    suffix: Option<String>,
    suffix_number: Option<u32>,
}

/// Component targeted by a version bump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionPart {
    Major,
    Minor,
    Patch,
}

impl Version {
    /// Create a new version without suffix
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
            suffix: None,
            suffix_number: None,
        }
    }

    /// Parse a version string such as `1.2.3`, `1.2.3dev`, `1.2.3-rc4`.
    ///
    /// Components may carry leading zeros (`01` parses as 1). Leading and
    /// trailing whitespace is ignored; anything else that does not match the
    /// grammar is rejected as a whole.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let caps = version_regex()
            .captures(trimmed)
            .ok_or_else(|| BumprError::format(format!("Invalid version: '{}'", text)))?;

        let component = |idx: usize, name: &str| -> Result<u32> {
            caps[idx].parse::<u32>().map_err(|_| {
                BumprError::format(format!("Invalid {} component in '{}'", name, text))
            })
        };

        let major = component(1, "major")?;
        let minor = component(2, "minor")?;
        let patch = component(3, "patch")?;

        let suffix = caps.get(4).map(|m| m.as_str().to_string());
        let suffix_number = match caps.get(5).map(|m| m.as_str()) {
            Some(digits) if !digits.is_empty() => Some(digits.parse::<u32>().map_err(|_| {
                BumprError::format(format!("Invalid suffix number in '{}'", text))
            })?),
            _ => None,
        };

        Ok(Version {
            major,
            minor,
            patch,
            suffix,
            suffix_number,
        })
    }

    /// Prerelease suffix, if any (`dev`, `rc`, ...)
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Serial number attached to the suffix, if any
    pub fn suffix_number(&self) -> Option<u32> {
        self.suffix_number
    }

    /// Whether this version carries a prerelease suffix
    pub fn is_prerelease(&self) -> bool {
        self.suffix.is_some()
    }

    /// Increment `part`, zeroing every less significant component.
    ///
    /// With `clear_suffix` the suffix and its number are dropped, otherwise
    /// they are carried over unchanged. Fails when the incremented component
    /// does not fit in a `u32`.
    pub fn bump(&self, part: VersionPart, clear_suffix: bool) -> Result<Self> {
        let increment = |value: u32| {
            value.checked_add(1).ok_or_else(|| {
                BumprError::format(format!("Cannot bump {} of '{}': overflow", part, self))
            })
        };
        let (major, minor, patch) = match part {
            VersionPart::Major => (increment(self.major)?, 0, 0),
            VersionPart::Minor => (self.major, increment(self.minor)?, 0),
            VersionPart::Patch => (self.major, self.minor, increment(self.patch)?),
        };

        let (suffix, suffix_number) = if clear_suffix {
            (None, None)
        } else {
            (self.suffix.clone(), self.suffix_number)
        };

        Ok(Version {
            major,
            minor,
            patch,
            suffix,
            suffix_number,
        })
    }

    /// Return a copy with the suffix set or cleared.
    ///
    /// Trailing digits of a suffix given without an explicit number become
    /// the serial number, so `with_suffix(Some("rc4"), None)` equals
    /// `parse("X.Y.Zrc4")`.
    pub fn with_suffix(&self, suffix: Option<&str>, number: Option<u32>) -> Result<Self> {
        let mut version = self.clone();

        match suffix {
            None => {
                if number.is_some() {
                    return Err(BumprError::format(
                        "A suffix number requires a suffix".to_string(),
                    ));
                }
                version.suffix = None;
                version.suffix_number = None;
            }
            Some(raw) => {
                let (name, trailing) = split_suffix(raw)?;
                version.suffix_number = match (trailing, number) {
                    (Some(_), Some(_)) => {
                        return Err(BumprError::format(format!(
                            "Suffix '{}' already ends with a number",
                            raw
                        )))
                    }
                    (trailing, None) => trailing,
                    (None, number) => number,
                };
                version.suffix = Some(name);
            }
        }

        Ok(version)
    }

    /// Canonical string rendering, identical to `to_string()`.
    pub fn format(&self) -> String {
        self.to_string()
    }
}

/// Validate a suffix and split its trailing digits off.
fn split_suffix(raw: &str) -> Result<(String, Option<u32>)> {
    let starts_with_letter = raw.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter || !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(BumprError::format(format!(
            "Invalid suffix '{}': expected a letter followed by letters or digits",
            raw
        )));
    }

    let name = raw.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &raw[name.len()..];
    if digits.is_empty() {
        return Ok((name.to_string(), None));
    }

    let number = digits
        .parse::<u32>()
        .map_err(|_| BumprError::format(format!("Invalid suffix number in '{}'", raw)))?;
    Ok((name.to_string(), Some(number)))
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(suffix) = &self.suffix {
            write!(f, "{}", suffix)?;
            if let Some(number) = self.suffix_number {
                write!(f, "{}", number)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = BumprError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

impl VersionPart {
    /// Lowercase name as used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            VersionPart::Major => "major",
            VersionPart::Minor => "minor",
            VersionPart::Patch => "patch",
        }
    }
}

impl fmt::Display for VersionPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VersionPart {
    type Err = BumprError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "major" => Ok(VersionPart::Major),
            "minor" => Ok(VersionPart::Minor),
            "patch" => Ok(VersionPart::Patch),
            other => Err(BumprError::config(format!(
                "Unknown version part '{}': expected major, minor or patch",
                other
            ))),
        }
    }
}

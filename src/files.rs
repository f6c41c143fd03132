//! Locating and substituting version strings in file contents.

use crate::domain::Version;
use crate::error::{BumprError, Result};
use regex::Regex;
use std::ops::Range;

/// Name of the capture group holding the version string
pub const VERSION_GROUP: &str = "version";

/// Finds the version string in the main version file with a configurable regex.
#[derive(Debug, Clone)]
pub struct VersionLocator {
    regex: Regex,
}

/// A version found in file content
#[derive(Debug, Clone, PartialEq)]
pub struct FoundVersion {
    pub version: Version,
    /// Text exactly as written in the file (may differ from the canonical form)
    pub raw: String,
    pub span: Range<usize>,
}

impl VersionLocator {
    /// Compile `pattern`, which must define a `version` named group.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| BumprError::config(format!("Invalid version regex: {}", e)))?;
        if !regex.capture_names().flatten().any(|name| name == VERSION_GROUP) {
            return Err(BumprError::config(format!(
                "Version regex '{}' has no '(?P<{}>...)' group",
                pattern, VERSION_GROUP
            )));
        }
        Ok(VersionLocator { regex })
    }

    /// Locate and parse the first version in `content`.
    pub fn find(&self, content: &str) -> Result<FoundVersion> {
        let group = self
            .regex
            .captures(content)
            .and_then(|caps| caps.name(VERSION_GROUP))
            .ok_or_else(|| {
                BumprError::format(format!(
                    "No version string matching '{}' found",
                    self.regex.as_str()
                ))
            })?;

        Ok(FoundVersion {
            version: Version::parse(group.as_str())?,
            raw: group.as_str().to_string(),
            span: group.range(),
        })
    }

    /// Replace the first located version in `content` with `new_version`.
    pub fn replace(&self, content: &str, new_version: &str) -> Result<String> {
        let found = self.find(content)?;
        let mut updated = String::with_capacity(content.len() + new_version.len());
        updated.push_str(&content[..found.span.start]);
        updated.push_str(new_version);
        updated.push_str(&content[found.span.end..]);
        Ok(updated)
    }
}

/// Replace every occurrence of `old` with `new`.
///
/// Returns `None` when `old` does not occur, so callers can warn about files
/// that were expected to carry the value.
pub fn replace_all(content: &str, old: &str, new: &str) -> Option<String> {
    if old.is_empty() || !content.contains(old) {
        return None;
    }
    Some(content.replace(old, new))
}

/// Replace every standalone occurrence of the version `old` with `new`.
///
/// An occurrence embedded in a longer version is left alone: it must not be
/// preceded by a digit or `.`, nor followed by a letter, a digit or a `.`
/// that starts another component. With `old = "1.0.0"`, `11.0.0`,
/// `1.0.0.1` and `1.0.0rc1` are kept while `v1.0.0` and `1.0.0.` change.
///
/// Returns `Ok(None)` when no standalone occurrence exists.
pub fn replace_version(content: &str, old: &str, new: &str) -> Result<Option<String>> {
    if old.is_empty() {
        return Ok(None);
    }
    let pattern = Regex::new(&regex::escape(old))
        .map_err(|e| BumprError::format(format!("Cannot search for '{}': {}", old, e)))?;

    let bytes = content.as_bytes();
    let mut updated = String::with_capacity(content.len());
    let mut last = 0;
    for found in pattern.find_iter(content) {
        if !is_standalone(bytes, found.start(), found.end()) {
            continue;
        }
        updated.push_str(&content[last..found.start()]);
        updated.push_str(new);
        last = found.end();
    }

    if last == 0 {
        return Ok(None);
    }
    updated.push_str(&content[last..]);
    Ok(Some(updated))
}

fn is_standalone(bytes: &[u8], start: usize, end: usize) -> bool {
    let before = start.checked_sub(1).map(|i| bytes[i]);
    if before.is_some_and(|b| b.is_ascii_digit() || b == b'.') {
        return false;
    }

    match bytes.get(end) {
        Some(b) if b.is_ascii_alphanumeric() => false,
        Some(b'.') => !bytes.get(end + 1).is_some_and(u8::is_ascii_digit),
        _ => true,
    }
}

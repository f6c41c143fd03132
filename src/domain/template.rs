//! Message templating for commit messages, tag names and changelog headers.
//!
//! Supported placeholders:
//! - `{version}` - the formatted version
//! - `{date}` - the run date as `%Y-%m-%d`
//! - `{date:FORMAT}` - the run date rendered with a strftime pattern
//!
//! `{{` and `}}` produce literal braces. Anything else is a template error.

use crate::error::{BumprError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use std::fmt::Write;

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Values available to a template
#[derive(Debug, Clone)]
pub struct TemplateVars<'a> {
    pub version: &'a str,
    pub date: DateTime<Local>,
}

impl<'a> TemplateVars<'a> {
    pub fn new(version: &'a str, date: DateTime<Local>) -> Self {
        TemplateVars { version, date }
    }
}

/// Render `template` with the given variables.
///
/// # Returns
/// * `Ok(String)` - The rendered text
/// * `Err(BumprError::Template)` - Unknown placeholder, unbalanced brace or invalid date format
pub fn render(template: &str, vars: &TemplateVars<'_>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(BumprError::template(format!(
                    "Unmatched '}}' in template '{}'",
                    template
                )))
            }
            '{' => {
                let mut placeholder = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    placeholder.push(next);
                }
                if !closed {
                    return Err(BumprError::template(format!(
                        "Unterminated placeholder in template '{}'",
                        template
                    )));
                }
                expand(&placeholder, vars, &mut out)?;
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

fn expand(placeholder: &str, vars: &TemplateVars<'_>, out: &mut String) -> Result<()> {
    let (name, spec) = match placeholder.split_once(':') {
        Some((name, spec)) => (name, Some(spec)),
        None => (placeholder, None),
    };

    match (name, spec) {
        ("version", None) => {
            out.push_str(vars.version);
            Ok(())
        }
        ("date", spec) => render_date(spec.unwrap_or(DEFAULT_DATE_FORMAT), vars, out),
        _ => Err(BumprError::template(format!(
            "Unknown placeholder '{{{}}}'",
            placeholder
        ))),
    }
}

fn render_date(format: &str, vars: &TemplateVars<'_>, out: &mut String) -> Result<()> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(BumprError::template(format!(
            "Invalid date format '{}'",
            format
        )));
    }

    write!(out, "{}", vars.date.format_with_items(items.iter()))
        .map_err(|_| BumprError::template(format!("Cannot render date format '{}'", format)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn vars(version: &str) -> TemplateVars<'_> {
        let date = Local.with_ymd_and_hms(2024, 3, 9, 12, 30, 0).unwrap();
        TemplateVars::new(version, date)
    }

    #[test]
    fn test_render_version() {
        let rendered = render("Bump version {version}", &vars("1.0.1")).unwrap();
        assert_eq!(rendered, "Bump version 1.0.1");
    }

    #[test]
    fn test_render_date_with_format() {
        let rendered = render("{version} ({date:%Y-%m-%d})", &vars("2.0.0")).unwrap();
        assert_eq!(rendered, "2.0.0 (2024-03-09)");
    }

    #[test]
    fn test_render_date_default_format() {
        assert_eq!(render("{date}", &vars("1.0.0")).unwrap(), "2024-03-09");
    }

    #[test]
    fn test_render_date_format_with_colon() {
        assert_eq!(render("{date:%H:%M}", &vars("1.0.0")).unwrap(), "12:30");
    }

    #[test]
    fn test_render_escaped_braces() {
        let rendered = render("{{version}} is {version}", &vars("1.0.0")).unwrap();
        assert_eq!(rendered, "{version} is 1.0.0");
    }

    #[test]
    fn test_render_without_placeholders() {
        assert_eq!(render("Current", &vars("1.0.0")).unwrap(), "Current");
    }

    #[test]
    fn test_unknown_placeholder_is_template_error() {
        let err = render("Release {tag}", &vars("1.0.0")).unwrap_err();
        assert!(matches!(err, BumprError::Template(_)));
        assert!(err.to_string().contains("{tag}"));
    }

    #[test]
    fn test_version_with_format_spec_is_rejected() {
        assert!(render("{version:>10}", &vars("1.0.0")).is_err());
    }

    #[test]
    fn test_unbalanced_braces_are_rejected() {
        assert!(render("Release {version", &vars("1.0.0")).is_err());
        assert!(render("Release }", &vars("1.0.0")).is_err());
    }

    #[test]
    fn test_invalid_date_format_is_rejected() {
        assert!(render("{date:%Q}", &vars("1.0.0")).is_err());
    }
}

//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic. Functions here do no
//! I/O beyond printing, and [`summary_lines`] is plain text so it can be
//! tested.

use console::style;

use crate::error::BumprError;
use crate::warning::ReleaseWarning;
use crate::workflow::ReleaseReport;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a release warning to the user.
pub fn display_warning(warning: &ReleaseWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Plain-text summary of a finished run, one line per fact.
pub fn summary_lines(report: &ReleaseReport) -> Vec<String> {
    let mut lines = Vec::new();
    let prefix = if report.dry_run { "[dry-run] " } else { "" };

    if let Some(released) = &report.released {
        lines.push(format!("{}Released {}", prefix, released));
    }
    if let Some(tag) = &report.tag {
        lines.push(format!("{}Tagged {}", prefix, tag));
    }
    if let Some(next) = &report.next {
        lines.push(format!("{}Prepared {}", prefix, next));
    }
    if let Some(failure) = &report.failure {
        lines.push(format!(
            "Partial success: {} failed ({})",
            failure.phase, failure.error
        ));
    }
    lines
}

/// Print the summary of a finished run.
///
/// A partial success is shown as an error line after the completed steps.
pub fn display_report(report: &ReleaseReport) {
    for warning in &report.warnings {
        display_warning(warning);
    }

    let lines = summary_lines(report);
    let (done, failed) = if report.is_partial() {
        lines.split_at(lines.len().saturating_sub(1))
    } else {
        (&lines[..], &[][..])
    };

    for line in done {
        display_success(line);
    }
    for line in failed {
        display_error(line);
    }
    if lines.is_empty() {
        display_status("Nothing to release");
    }
}

/// Print an aborted run with its phase-specific hint.
pub fn display_failure(error: &BumprError) {
    display_error(&error.to_string());
    if let BumprError::DirtyRepo = error {
        display_status("Commit or stash your changes, then run again");
    }
}

//! User interface module - terminal output.
//!
//! Logs go to stderr through `tracing`; the lines printed here are the
//! human-facing summary of a run.

pub mod formatter;

pub use formatter::{
    display_error, display_failure, display_report, display_status, display_success, display_warning,
    summary_lines,
};

//! Command-line orchestration, decoupled from argument parsing.

pub mod orchestration;

pub use orchestration::{apply_overrides, build_context, build_registry, run_release, ReleaseArgs};

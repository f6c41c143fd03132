//! Release workflow engine
//!
//! [`Workflow`] sequences the release [`Phase`]s over a [`Context`] that
//! carries the mutable state of a single run.

pub mod context;
pub mod engine;
pub mod phase;

pub use context::{Context, FileSnapshot};
pub use engine::{PhaseFailure, ReleaseReport, Workflow};
pub use phase::Phase;

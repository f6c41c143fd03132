//! Hook system for extending the release workflow
//!
//! Hooks run before and after every phase (`before_bump`, `after_publish`,
//! ...) and when a failed run is rolled back (`on_rollback`):
//! - [`registry`] - hook points, the [`Hook`] trait and the ordered registry
//! - [`executor`] - user shell commands from `[[hooks]]` and `[commands]`
//! - [`builtin`] - changelog maintenance, development marker replacement and
//!   Read the Docs links

pub mod builtin;
pub mod executor;
pub mod registry;

pub use builtin::{ChangelogHook, Mode, ReadTheDocsHook, ReplaceHook};
pub use executor::CommandHook;
pub use registry::{FnHook, Hook, HookPoint, HookRegistry};

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod files;
pub mod hooks;
pub mod logging;
pub mod process;
pub mod ui;
pub mod vcs;
pub mod warning;
pub mod workflow;

pub use error::{BumprError, Result};

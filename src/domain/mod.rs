//! Domain logic - pure release rules independent of files and VCS

pub mod template;
pub mod version;

pub use template::{render, TemplateVars};
pub use version::{Version, VersionPart};

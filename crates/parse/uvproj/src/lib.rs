//! `uvproj` --- an owned, read-only model of Keil µVision project files.
//!
//! A `.uvproj` / `.uvprojx` document is a three-level tree: targets contain
//! groups, groups contain files. Every level may carry a fragment of compiler
//! flags (`VariousControls`) plus an inclusion marker. This crate loads the
//! document once into an immutable [`Element`] tree, indexes its targets by
//! name, and resolves and merges the flag fragments.
//!
//! # Usage
//!
//! ```ignore
//! let project = Project::load("board.uvprojx")?;
//! let target = project.target("Debug").unwrap();
//! let base = FlagSet::resolve(target, Dialect::Arm).unwrap_or_default();
//! for group in target.groups() {
//!     // ...
//! }
//! ```

pub mod element;
pub mod error;
pub mod flags;
pub mod project;

pub use element::Element;
pub use error::Error;
pub use flags::{DefineUnescape, Dialect, EffectiveFlags, FlagSet, Macro, RenderOptions};
pub use project::{FileEntry, Group, Inclusion, Project, Target, TreeNode};

/// Converts Windows path separators to `/`.
#[must_use]
pub fn to_posix_path(path: &str) -> String {
    path.replace('\\', "/")
}

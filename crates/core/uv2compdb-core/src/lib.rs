//! `uv2compdb-core` --- compile-command resolution for Keil µVision projects.
//!
//! Given a loaded [`uvproj::Project`], a [`Session`] works out the exact
//! compiler invocation of every source file of a target:
//!
//! - the toolchain comes from the last build log, or from the toolset the
//!   project declares ([`toolchain`]);
//! - ARM targets take their per-file arguments from the `.dep` record of the
//!   last build ([`dep`]), falling back to the declared flags;
//! - C51 targets always use the declared flags, merged target → group →
//!   file;
//! - predefined macros can be queried from the compiler ([`macros`]).
//!
//! The result is a list of [`CommandObject`]s, ready to be serialized as a
//! clang compilation database.
//!
//! # Usage
//!
//! ```ignore
//! let project = uv2compdb_core::load_project("board.uvprojx")?;
//! let mut session = Session::new(&project, Options::default());
//! let commands = session.generate("Debug")?;
//! ```

pub mod build;
pub mod command;
pub mod dep;
pub mod error;
pub mod family;
pub mod macros;
pub mod policy;
pub mod session;
pub mod toolchain;

use std::path::Path;

pub use build::{BuildAction, BuildStatus, Uv4};
pub use command::{CommandObject, FileObject};
pub use error::Error;
pub use family::{Family, MacroQuery};
pub use macros::{CompilerRunner, MacroExtractor, ProcessRunner};
pub use session::{FileSource, Options, Session, TargetSetting};
pub use toolchain::Toolchain;
pub use uvproj::{DefineUnescape, Project, RenderOptions};

/// Loads a project file.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] if the file cannot be read or parsed.
pub fn load_project(path: impl AsRef<Path>) -> Result<Project, Error> {
    Ok(Project::load(path)?)
}

//! Error taxonomy of the resolution engine.
//!
//! Only [`Error::MalformedInput`], [`Error::TargetNotFound`] and
//! [`Error::ToolchainUnresolved`] leave the [`Session`](crate::Session) API.
//! The remaining variants are produced by components and absorbed at their
//! boundary into an empty or fallback result plus a warning.

use std::path::PathBuf;

/// Errors produced while resolving a project.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The project description could not be loaded. Fatal.
    #[error(transparent)]
    MalformedInput(#[from] uvproj::Error),
    /// The requested target does not exist in the project.
    #[error("target '{0}' not found")]
    TargetNotFound(String),
    /// Neither the build log nor the declared metadata identified a
    /// toolchain.
    #[error("no toolchain could be resolved for target '{0}'")]
    ToolchainUnresolved(String),
    /// A build artifact is missing, even after an optional build attempt.
    #[error("artifact not available: {}", .0.display())]
    ArtifactUnavailable(PathBuf),
    /// An external tool could not be started or exited abnormally.
    #[error("failed to invoke {program}: {reason}")]
    ExternalInvocation {
        /// Program that was run.
        program: String,
        /// What went wrong.
        reason: String,
    },
}

//! Error types for project loading.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while loading a project description.
///
/// Every variant means no meaningful output can be produced from the
/// document, so callers treat them as fatal.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The project file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path of the project file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The project file is not well-formed XML.
    #[error("malformed project {}: {source}", path.display())]
    Xml {
        /// Path of the project file.
        path: PathBuf,
        /// Underlying parser error.
        #[source]
        source: roxmltree::Error,
    },
    /// The document parsed but is not a µVision project.
    #[error("malformed project {}: root element is <{found}>, expected <Project>", path.display())]
    UnexpectedRoot {
        /// Path of the project file.
        path: PathBuf,
        /// Name of the root element that was found.
        found: String,
    },
}

//! # Design
//!
//! - Structured, constant-message errors for scratch-storage operations.
//! - Capture operation context (paths) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for scratch-storage operations.
pub type ScratchResult<T> = Result<T, ScratchError>;

/// Errors produced by scratch-storage handling.
#[derive(Debug, Error)]
pub enum ScratchError {
    /// IO failures while interacting with the scratch directory.
    #[error("scratch io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The scratch root is not a usable directory.
    #[error("scratch root unusable")]
    RootUnusable {
        /// Configured scratch root.
        path: PathBuf,
        /// Static reason for the failure.
        reason: &'static str,
    },
}

impl ScratchError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

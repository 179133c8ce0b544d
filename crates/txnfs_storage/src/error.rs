//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The artifact does not exist.
    #[error("artifact not found: {}", path.display())]
    NotFound {
        /// Path of the missing artifact.
        path: PathBuf,
    },

    /// The parent directory of an artifact does not exist.
    #[error("parent directory missing for {}", path.display())]
    ParentMissing {
        /// Path of the artifact being written.
        path: PathBuf,
    },
}

impl StorageError {
    /// Converts an I/O error into a storage error, keeping `NotFound` distinct.
    pub(crate) fn from_io(err: io::Error, path: &std::path::Path) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }

    /// Returns true if this error reports a missing artifact.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

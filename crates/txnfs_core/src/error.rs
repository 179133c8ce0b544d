//! Error types for txnfs core.

use crate::transaction::TxnStatus;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type TxnResult<T> = Result<T, TxnError>;

/// Errors that can occur in txnfs core operations.
#[derive(Debug, Error)]
pub enum TxnError {
    /// Artifact store error (read, write, copy, or remove failed).
    #[error("storage error: {0}")]
    Storage(#[from] txnfs_storage::StorageError),

    /// I/O error outside the artifact store (path resolution).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation not permitted in the current transaction status.
    #[error("cannot {operation} while {status}: {message}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// Status at the time of the call.
        status: TxnStatus,
        /// Why the operation was rejected.
        message: String,
    },

    /// A logical file name could not be resolved under the registry root.
    #[error("invalid transaction file name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The registry root directory does not exist.
    #[error("txn_fs root folder does not exist at: {}", path.display())]
    RootMissing {
        /// The missing root.
        path: PathBuf,
    },

    /// A status record could not be serialized.
    #[error("failed to encode status record: {0}")]
    LogEncode(#[from] serde_json::Error),
}

impl TxnError {
    /// Creates an invalid state error.
    pub fn invalid_state(
        operation: &'static str,
        status: TxnStatus,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            operation,
            status,
            message: message.into(),
        }
    }

    /// Creates an invalid name error.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the operation was rejected because of the current status.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    /// Returns true if the error came from the underlying storage.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_))
    }
}

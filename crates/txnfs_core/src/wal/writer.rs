//! Status log writer.

use crate::error::TxnResult;
use crate::transaction::TxnStatus;
use crate::wal::reader::{scan, LogScan};
use crate::wal::record::StatusRecord;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use txnfs_storage::ArtifactStore;

/// Reads and writes the status log of one transactional file.
///
/// The log is a plain artifact in the store; `StatusLog` only knows how to
/// encode records and which write mode to use.
pub struct StatusLog {
    /// Path of the log artifact.
    path: PathBuf,
    /// Store holding the log.
    store: Arc<dyn ArtifactStore>,
}

impl StatusLog {
    /// Creates a status log handle. Nothing is written until the first record.
    pub fn new(path: impl Into<PathBuf>, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            path: path.into(),
            store,
        }
    }

    /// Returns the log path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the log artifact exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.store.exists(&self.path)
    }

    /// Replaces the whole log with a single record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub fn reset(&self, status: TxnStatus) -> TxnResult<()> {
        let line = StatusRecord::new(status).encode_line()?;
        self.store.write(&self.path, &line)?;
        debug!(log = %self.path.display(), %status, "status log reset");
        Ok(())
    }

    /// Appends one record to the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub fn append(&self, status: TxnStatus) -> TxnResult<()> {
        let line = StatusRecord::new(status).encode_line()?;
        self.store.append(&self.path, &line)?;
        debug!(log = %self.path.display(), %status, "status record appended");
        Ok(())
    }

    /// Reads and scans the whole log.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read. Unreadable records are
    /// not errors; see [`scan`].
    pub fn scan(&self) -> TxnResult<LogScan> {
        let bytes = self.store.read(&self.path)?;
        Ok(scan(&bytes))
    }
}

impl std::fmt::Debug for StatusLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusLog")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

//! Artifact store trait definition.

use crate::error::StorageResult;
use std::path::Path;

/// A whole-file storage backend for txnfs artifacts.
///
/// Stores are **opaque byte stores** addressed by path. They provide simple
/// operations for reading, replacing, appending, and removing files. txnfs
/// owns all interpretation - stores do not understand status records,
/// staging files, or snapshots.
///
/// # Invariants
///
/// - `read` returns exactly the bytes of the most recent `write` plus any
///   subsequent `append`s
/// - `write` replaces the whole file (truncate then write)
/// - `append` creates the file if it does not exist
/// - Every call blocks until the operation has completed
/// - Stores must be `Send + Sync` so one instance can back many handles
///
/// # Implementors
///
/// - [`super::FileStore`] - For persistent storage
/// - [`super::InMemoryStore`] - For testing
pub trait ArtifactStore: Send + Sync {
    /// Returns true if a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if a directory exists at `path`.
    fn dir_exists(&self, path: &Path) -> bool;

    /// Reads the whole file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::NotFound`] if the file is absent, or an
    /// I/O error if reading fails.
    fn read(&self, path: &Path) -> StorageResult<Vec<u8>>;

    /// Replaces the file at `path` with `data`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory is missing or an I/O error
    /// occurs.
    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()>;

    /// Appends `data` to the file at `path`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory is missing or an I/O error
    /// occurs.
    fn append(&self, path: &Path, data: &[u8]) -> StorageResult<()>;

    /// Removes the file at `path`.
    ///
    /// Returns `false` if there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    fn remove(&self, path: &Path) -> StorageResult<bool>;

    /// Creates `path` and every missing ancestor directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> StorageResult<()>;

    /// Copies `from` over `to`.
    ///
    /// A missing source is not an error: nothing is written and `false` is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be read or the destination
    /// cannot be written.
    fn copy(&self, from: &Path, to: &Path) -> StorageResult<bool> {
        if !self.exists(from) {
            return Ok(false);
        }
        let data = self.read(from)?;
        self.write(to, &data)?;
        Ok(true)
    }
}

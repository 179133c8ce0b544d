//! File-based artifact store for persistent storage.

use crate::error::{StorageError, StorageResult};
use crate::store::ArtifactStore;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// A file-based artifact store.
///
/// This store performs every operation directly against OS file APIs.
/// Data survives process restarts.
///
/// # Durability
///
/// Writes are ordinary synchronous writes: each call returns once the
/// data has been handed to the OS. No `fsync` is issued; crash safety of
/// txnfs relies on the ordering of log writes relative to data writes.
///
/// # Example
///
/// ```no_run
/// use txnfs_storage::{ArtifactStore, FileStore};
/// use std::path::Path;
///
/// let store = FileStore::new();
/// store.write(Path::new("data.bin"), b"persistent data").unwrap();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    /// Creates a new file store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn write_error(err: io::Error, path: &Path) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        StorageError::ParentMissing {
            path: path.to_path_buf(),
        }
    } else {
        StorageError::Io(err)
    }
}

impl ArtifactStore for FileStore {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        fs::read(path).map_err(|e| StorageError::from_io(e, path))
    }

    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut file = File::create(path).map_err(|e| write_error(e, path))?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    fn append(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| write_error(e, path))?;
        file.write_all(data)?;
        file.flush()?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> StorageResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }
}

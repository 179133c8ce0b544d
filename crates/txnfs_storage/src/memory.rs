//! In-memory artifact store for testing.

use crate::error::{StorageError, StorageResult};
use crate::store::ArtifactStore;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// An in-memory artifact store.
///
/// This store keeps all files in memory and is suitable for:
/// - Unit tests
/// - Simulating crash states without touching the disk
///
/// Directories are tracked so that writes into a missing parent fail the
/// same way they do on a real filesystem. Relative paths with no parent
/// (and the filesystem root) always count as existing directories.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use txnfs_storage::{ArtifactStore, InMemoryStore};
/// use std::path::Path;
///
/// let store = InMemoryStore::new();
/// store.append(Path::new("log"), b"one\n").unwrap();
/// store.append(Path::new("log"), b"two\n").unwrap();
/// assert_eq!(store.read(Path::new("log")).unwrap(), b"one\ntwo\n");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    files: RwLock<HashMap<PathBuf, Vec<u8>>>,
    dirs: RwLock<HashSet<PathBuf>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with `dir` (and its ancestors) already present.
    #[must_use]
    pub fn with_dir(dir: &Path) -> Self {
        let store = Self::new();
        store.insert_dirs(dir);
        store
    }

    /// Returns the paths of all stored files, sorted.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.files.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn insert_dirs(&self, dir: &Path) {
        let mut dirs = self.dirs.write();
        for ancestor in dir.ancestors() {
            if is_implicit_dir(ancestor) {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }

    fn check_parent(&self, path: &Path) -> StorageResult<()> {
        match path.parent() {
            Some(parent) if !self.dir_exists(parent) => Err(StorageError::ParentMissing {
                path: path.to_path_buf(),
            }),
            _ => Ok(()),
        }
    }
}

fn is_implicit_dir(dir: &Path) -> bool {
    dir.as_os_str().is_empty() || dir.parent().is_none()
}

impl ArtifactStore for InMemoryStore {
    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }

    fn dir_exists(&self, path: &Path) -> bool {
        is_implicit_dir(path) || self.dirs.read().contains(path)
    }

    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                path: path.to_path_buf(),
            })
    }

    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        self.check_parent(path)?;
        self.files.write().insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn append(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        self.check_parent(path)?;
        self.files
            .write()
            .entry(path.to_path_buf())
            .or_default()
            .extend_from_slice(data);
        Ok(())
    }

    fn remove(&self, path: &Path) -> StorageResult<bool> {
        Ok(self.files.write().remove(path).is_some())
    }

    fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        self.insert_dirs(path);
        Ok(())
    }
}

//! Test fixtures and transactional file helpers.
//!
//! Provides convenience functions for setting up transactional files and
//! registries with automatic cleanup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use txnfs_core::{ArtifactPaths, Config, TransactionalFile, TxnFileRegistry};
use txnfs_storage::{ArtifactStore, FileStore, InMemoryStore};

/// A transactional file with automatic cleanup.
pub struct TestFile {
    /// The transactional file.
    pub file: TransactionalFile,
    /// Store backing the file.
    pub store: Arc<dyn ArtifactStore>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestFile {
    /// Creates a file over a fresh in-memory store.
    pub fn memory() -> Self {
        let store: Arc<dyn ArtifactStore> = Arc::new(InMemoryStore::new());
        Self {
            file: TransactionalFile::with_store(ArtifactPaths::new("test.bin"), Arc::clone(&store)),
            store,
            _temp_dir: None,
        }
    }

    /// Creates a file on disk in a temporary directory.
    pub fn on_disk() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store: Arc<dyn ArtifactStore> = Arc::new(FileStore::new());
        let paths = ArtifactPaths::new(temp_dir.path().join("test.bin"));
        Self {
            file: TransactionalFile::with_store(paths, Arc::clone(&store)),
            store,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the temporary directory if on disk, None if in memory.
    pub fn dir(&self) -> Option<&Path> {
        self._temp_dir.as_ref().map(TempDir::path)
    }

    /// Replaces the file with a fresh handle over the same artifacts.
    ///
    /// This is what a process restart looks like: in-memory status is lost
    /// and only the artifacts survive.
    pub fn restart(&mut self) {
        let paths = self.file.paths().clone();
        self.file = TransactionalFile::with_store(paths, Arc::clone(&self.store));
    }

    /// Returns the primary content straight from the store.
    pub fn primary_bytes(&self) -> Vec<u8> {
        self.store
            .read(self.file.paths().primary())
            .expect("Failed to read primary file")
    }
}

impl std::ops::Deref for TestFile {
    type Target = TransactionalFile;

    fn deref(&self) -> &Self::Target {
        &self.file
    }
}

impl std::ops::DerefMut for TestFile {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.file
    }
}

/// Runs a test with a begun in-memory transactional file.
///
/// # Example
///
/// ```rust
/// use txnfs_testkit::fixtures::with_active_file;
///
/// with_active_file(|file| {
///     file.write_file(b"hello").unwrap();
///     file.commit().unwrap();
///     assert_eq!(file.read_file().unwrap(), b"hello");
/// });
/// ```
pub fn with_active_file<F, R>(f: F) -> R
where
    F: FnOnce(&mut TransactionalFile) -> R,
{
    let mut test_file = TestFile::memory();
    test_file.begin().expect("Failed to begin transaction");
    f(&mut test_file.file)
}

/// Runs a test with a registry rooted in a temporary directory.
pub fn with_temp_registry<F, R>(f: F) -> R
where
    F: FnOnce(&TxnFileRegistry, &Path) -> R,
{
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let root: PathBuf = temp_dir.path().join("txn_fs");
    let registry = TxnFileRegistry::open(Config::new(&root).create_root_if_missing(true))
        .expect("Failed to open registry");
    f(&registry, &root)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// Creates an active in-memory file whose primary holds `content`.
    pub fn committed_file(content: &[u8]) -> TestFile {
        let mut test_file = TestFile::memory();
        test_file.begin().expect("Failed to begin transaction");
        test_file.write_file(content).expect("Failed to stage content");
        test_file.commit().expect("Failed to commit content");
        test_file
    }

    /// Creates an active file that committed every version in order.
    ///
    /// The rollback file holds the second-to-last version.
    pub fn file_with_history(versions: &[&[u8]]) -> TestFile {
        let mut test_file = TestFile::memory();
        test_file.begin().expect("Failed to begin transaction");
        for version in versions {
            test_file.write_file(version).expect("Failed to stage content");
            test_file.commit().expect("Failed to commit content");
        }
        test_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txnfs_core::TxnStatus;

    #[test]
    fn test_memory_file() {
        let test_file = TestFile::memory();
        assert_eq!(test_file.status(), TxnStatus::NoTransaction);
        assert!(test_file.dir().is_none());
    }

    #[test]
    fn test_on_disk_file_lives_in_temp_dir() {
        let mut test_file = TestFile::on_disk();
        test_file.begin().unwrap();

        let dir = test_file.dir().unwrap().to_path_buf();
        assert!(dir.join("test.bin").is_file());
        assert!(dir.join("test.bin.txn.log").is_file());
    }

    #[test]
    fn test_restart_drops_in_memory_state() {
        let mut test_file = scenarios::committed_file(b"kept");
        test_file.write_file(b"lost").unwrap();

        test_file.restart();
        assert_eq!(test_file.status(), TxnStatus::NoTransaction);

        test_file.begin().unwrap();
        assert_eq!(test_file.read_file().unwrap(), b"kept");
    }

    #[test]
    fn test_history_scenario_rolls_back_one_version() {
        let mut test_file = scenarios::file_with_history(&[b"v1", b"v2", b"v3"]);
        test_file.rollback().unwrap();
        assert_eq!(test_file.primary_bytes(), b"v2");
    }

    #[test]
    fn test_with_temp_registry() {
        with_temp_registry(|registry, root| {
            assert_eq!(registry.root(), root);
            let handle = registry.get("a.json").unwrap();
            handle.lock().begin().unwrap();
            assert!(root.join("a.json").is_file());
        });
    }
}

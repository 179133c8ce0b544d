//! Transactional file registry.
//!
//! Resolves logical file names under a root directory and hands out exactly
//! one [`TransactionalFile`] per resolved path. The registry is an explicit
//! object: the application creates it once, passes it by reference, and
//! entries are added lazily on first lookup. Entries are never evicted.

use crate::config::Config;
use crate::error::{TxnError, TxnResult};
use crate::paths::ArtifactPaths;
use crate::transaction::TransactionalFile;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use txnfs_storage::{ArtifactStore, FileStore};

/// Shared handle to a transactional file.
///
/// Callers sharing a handle serialize their operations through the mutex.
pub type TxnFileHandle = Arc<Mutex<TransactionalFile>>;

/// Registry of transactional files under one root directory.
///
/// # Example
///
/// ```rust
/// use txnfs_core::{Config, TxnFileRegistry};
///
/// let dir = tempfile::tempdir().unwrap();
/// let registry = TxnFileRegistry::open(Config::new(dir.path())).unwrap();
///
/// let handle = registry.get("accounts/ledger.json").unwrap();
/// let mut file = handle.lock();
/// file.begin().unwrap();
/// file.write_file(b"{}").unwrap();
/// file.commit().unwrap();
/// ```
pub struct TxnFileRegistry {
    /// Configuration the registry was opened with.
    config: Config,
    /// Absolute root directory.
    root: PathBuf,
    /// Store shared by every handle.
    store: Arc<dyn ArtifactStore>,
    /// Handles by absolute primary path.
    handles: Mutex<HashMap<PathBuf, TxnFileHandle>>,
}

impl TxnFileRegistry {
    /// Opens a registry backed by the OS filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`TxnError::RootMissing`] if the root does not exist and
    /// `create_root_if_missing` is false, or an I/O error if the root cannot
    /// be made absolute or created.
    pub fn open(config: Config) -> TxnResult<Self> {
        Self::with_store(config, Arc::new(FileStore::new()))
    }

    /// Opens a registry over an explicit store.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub fn with_store(config: Config, store: Arc<dyn ArtifactStore>) -> TxnResult<Self> {
        let root = std::path::absolute(&config.root)?;

        if !store.dir_exists(&root) {
            if !config.create_root_if_missing {
                return Err(TxnError::RootMissing { path: root });
            }
            store.create_dir_all(&root)?;
            info!(root = %root.display(), "created txn_fs root");
        }

        Ok(Self {
            config,
            root,
            store,
            handles: Mutex::new(HashMap::new()),
        })
    }

    /// Returns the absolute root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the number of handles created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    /// Returns true if no handle has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }

    /// Resolves a logical name to an absolute path under the root.
    ///
    /// The name is normalized lexically: `.` segments are dropped and `..`
    /// segments remove the previous segment.
    ///
    /// # Errors
    ///
    /// Returns [`TxnError::InvalidName`] if the name is empty, absolute,
    /// climbs above the root, or resolves to the root itself.
    pub fn resolve(&self, name: &str) -> TxnResult<PathBuf> {
        if name.is_empty() {
            return Err(TxnError::invalid_name(name, "name can't be empty"));
        }

        let mut resolved = self.root.clone();
        let mut depth = 0usize;
        for component in Path::new(name).components() {
            match component {
                Component::Normal(segment) => {
                    resolved.push(segment);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(TxnError::invalid_name(name, "escapes the root directory"));
                    }
                    resolved.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(TxnError::invalid_name(name, "must be relative to the root"));
                }
            }
        }

        if depth == 0 {
            return Err(TxnError::invalid_name(name, "resolves to the root directory"));
        }
        Ok(resolved)
    }

    /// Returns the handle for `name`, creating it on first access.
    ///
    /// Names that resolve to the same path share one handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the name cannot be resolved (see
    /// [`resolve`](Self::resolve)).
    pub fn get(&self, name: &str) -> TxnResult<TxnFileHandle> {
        let path = self.resolve(name)?;
        let mut handles = self.handles.lock();

        let handle = handles.entry(path).or_insert_with_key(|path| {
            info!(path = %path.display(), "creating transactional file handle");
            let paths = ArtifactPaths::from_config(path.clone(), &self.config);
            Arc::new(Mutex::new(TransactionalFile::with_store(
                paths,
                Arc::clone(&self.store),
            )))
        });
        Ok(Arc::clone(handle))
    }
}

impl std::fmt::Debug for TxnFileRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxnFileRegistry")
            .field("root", &self.root)
            .field("handles", &self.len())
            .finish_non_exhaustive()
    }
}

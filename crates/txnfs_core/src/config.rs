//! Registry configuration.

use crate::paths::{DIRTY_SUFFIX, LOG_SUFFIX, ROLLBACK_SUFFIX};
use std::env;
use std::path::PathBuf;

/// Environment variable that overrides the discovered root directory.
pub const ROOT_ENV_VAR: &str = "TXNFS_ROOT";

/// Name of the root directory looked up by [`Config::discover`].
const DEFAULT_ROOT_DIR: &str = "txn_fs";

/// Configuration for a [`crate::TxnFileRegistry`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that logical file names are resolved against.
    pub root: PathBuf,

    /// Whether to create the root directory if it doesn't exist.
    pub create_root_if_missing: bool,

    /// Suffix appended to the primary path for the staging file.
    pub dirty_suffix: String,

    /// Suffix appended to the primary path for the rollback snapshot.
    pub rollback_suffix: String,

    /// Suffix appended to the primary path for the status log.
    pub log_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT_DIR),
            create_root_if_missing: false,
            dirty_suffix: DIRTY_SUFFIX.to_string(),
            rollback_suffix: ROLLBACK_SUFFIX.to_string(),
            log_suffix: LOG_SUFFIX.to_string(),
        }
    }
}

impl Config {
    /// Creates a configuration rooted at `root` with default values.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Locates the root directory the way deployments expect it.
    ///
    /// Lookup order:
    /// 1. `$TXNFS_ROOT` if set and non-empty
    /// 2. `txn_fs` next to the running executable, if that directory exists
    /// 3. `txn_fs` under the current working directory
    ///
    /// The result is not checked for existence beyond step 2; opening a
    /// registry reports a missing root.
    #[must_use]
    pub fn discover() -> Self {
        if let Some(root) = env::var_os(ROOT_ENV_VAR).filter(|v| !v.is_empty()) {
            return Self::new(root);
        }

        let beside_exe = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_ROOT_DIR)));
        if let Some(root) = beside_exe.filter(|p| p.is_dir()) {
            return Self::new(root);
        }

        let cwd = env::current_dir().unwrap_or_default();
        Self::new(cwd.join(DEFAULT_ROOT_DIR))
    }

    /// Sets the root directory.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Sets whether to create the root directory if missing.
    #[must_use]
    pub const fn create_root_if_missing(mut self, value: bool) -> Self {
        self.create_root_if_missing = value;
        self
    }

    /// Sets the staging file suffix.
    #[must_use]
    pub fn dirty_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.dirty_suffix = suffix.into();
        self
    }

    /// Sets the rollback snapshot suffix.
    #[must_use]
    pub fn rollback_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.rollback_suffix = suffix.into();
        self
    }

    /// Sets the status log suffix.
    #[must_use]
    pub fn log_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.log_suffix = suffix.into();
        self
    }
}

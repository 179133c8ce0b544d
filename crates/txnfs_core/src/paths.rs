//! Artifact naming.
//!
//! Every transactional file owns four artifacts, all derived from the
//! primary path by suffixing:
//!
//! ```text
//! <path>                # primary
//! <path>.txn.dirty      # staging area for uncommitted writes
//! <path>.txn.rollback   # pre-commit snapshot
//! <path>.txn.log        # status log
//! ```

use crate::config::Config;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Default suffix of the dirty (staging) file.
pub const DIRTY_SUFFIX: &str = ".txn.dirty";
/// Default suffix of the rollback snapshot.
pub const ROLLBACK_SUFFIX: &str = ".txn.rollback";
/// Default suffix of the status log.
pub const LOG_SUFFIX: &str = ".txn.log";

/// The four artifact paths of one transactional file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    primary: PathBuf,
    dirty: PathBuf,
    rollback: PathBuf,
    log: PathBuf,
}

impl ArtifactPaths {
    /// Derives artifact paths using the default suffixes.
    #[must_use]
    pub fn new(primary: impl Into<PathBuf>) -> Self {
        Self::with_suffixes(primary, DIRTY_SUFFIX, ROLLBACK_SUFFIX, LOG_SUFFIX)
    }

    /// Derives artifact paths using the suffixes configured in `config`.
    #[must_use]
    pub fn from_config(primary: impl Into<PathBuf>, config: &Config) -> Self {
        Self::with_suffixes(
            primary,
            &config.dirty_suffix,
            &config.rollback_suffix,
            &config.log_suffix,
        )
    }

    /// Derives artifact paths using explicit suffixes.
    #[must_use]
    pub fn with_suffixes(
        primary: impl Into<PathBuf>,
        dirty_suffix: &str,
        rollback_suffix: &str,
        log_suffix: &str,
    ) -> Self {
        let primary = primary.into();
        Self {
            dirty: suffixed(&primary, dirty_suffix),
            rollback: suffixed(&primary, rollback_suffix),
            log: suffixed(&primary, log_suffix),
            primary,
        }
    }

    /// Returns the primary file path.
    #[must_use]
    pub fn primary(&self) -> &Path {
        &self.primary
    }

    /// Returns the dirty (staging) file path.
    #[must_use]
    pub fn dirty(&self) -> &Path {
        &self.dirty
    }

    /// Returns the rollback snapshot path.
    #[must_use]
    pub fn rollback(&self) -> &Path {
        &self.rollback
    }

    /// Returns the status log path.
    #[must_use]
    pub fn log(&self) -> &Path {
        &self.log
    }
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

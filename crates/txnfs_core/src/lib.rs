//! # txnfs Core
//!
//! Crash-recoverable transactions over a single file.
//!
//! This crate provides:
//! - [`TransactionalFile`]: begin/commit/rollback over one primary file
//! - A status log (write-ahead log of state transitions) and the recovery
//!   procedure that replays it on the next `begin`
//! - [`TxnFileRegistry`]: one shared handle per resolved path under a root
//!
//! ## On-disk layout
//!
//! ```text
//! <path>                # primary file (committed content)
//! <path>.txn.dirty      # staged, uncommitted content
//! <path>.txn.rollback   # snapshot of primary taken before each commit
//! <path>.txn.log        # one JSON status record per line
//! ```
//!
//! ## Example
//!
//! ```rust
//! use txnfs_core::TransactionalFile;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut file = TransactionalFile::new(dir.path().join("data.bin"));
//!
//! file.begin().unwrap();
//! file.write_file(b"hello").unwrap();
//! file.commit().unwrap();
//! assert_eq!(file.read_file().unwrap(), b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod paths;
mod registry;
mod transaction;
pub mod wal;

pub use config::{Config, ROOT_ENV_VAR};
pub use error::{TxnError, TxnResult};
pub use paths::{ArtifactPaths, DIRTY_SUFFIX, LOG_SUFFIX, ROLLBACK_SUFFIX};
pub use registry::{TxnFileHandle, TxnFileRegistry};
pub use transaction::{RecoveryAction, RecoveryReport, TransactionalFile, TxnStatus};

/// Crate version, as published in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

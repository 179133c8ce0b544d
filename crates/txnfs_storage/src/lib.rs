//! # txnfs Storage
//!
//! Artifact store trait and implementations for txnfs.
//!
//! This crate provides the lowest-level storage abstraction for txnfs.
//! Stores are **opaque whole-file byte stores** - they do not interpret
//! the artifacts they hold.
//!
//! ## Design Principles
//!
//! - Stores operate on whole files addressed by path (read, write, append, remove)
//! - No knowledge of status logs, dirty files, or rollback snapshots
//! - Must be `Send + Sync` so a single store can back every handle in a registry
//! - txnfs core owns all artifact naming and protocol ordering
//!
//! ## Available Stores
//!
//! - [`FileStore`] - Persistent storage using OS file APIs
//! - [`InMemoryStore`] - For testing and ephemeral use
//!
//! ## Example
//!
//! ```rust
//! use txnfs_storage::{ArtifactStore, InMemoryStore};
//! use std::path::Path;
//!
//! let store = InMemoryStore::new();
//! store.write(Path::new("data.bin"), b"hello world").unwrap();
//! assert_eq!(store.read(Path::new("data.bin")).unwrap(), b"hello world");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use store::ArtifactStore;

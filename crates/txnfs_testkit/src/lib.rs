//! # txnfs Testkit
//!
//! Test utilities for txnfs.
//!
//! This crate provides:
//! - Test fixtures for transactional files and registries
//! - A fault-injecting store that simulates crashes mid-protocol
//! - A crash recovery harness covering every durable step
//! - A reference model for single-file transactions
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use txnfs_testkit::prelude::*;
//!
//! with_active_file(|file| {
//!     file.write_file(b"v1").unwrap();
//!     file.commit().unwrap();
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod faulty;
pub mod fixtures;
pub mod generators;
pub mod model;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::faulty::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::init_tracing;
}

pub use fixtures::*;
pub use generators::*;

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test-friendly tracing subscriber once per process.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Output goes
/// through the test writer so it is captured per test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

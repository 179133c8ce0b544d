//! Property-based test generators using proptest.
//!
//! Provides strategies for file payloads, status logs, and operation
//! sequences against a single transactional file.

use crate::crash::CrashPoint;
use proptest::prelude::*;
use txnfs_core::TxnStatus;

/// Strategy for generating file contents (arbitrary bytes, empty included).
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Strategy for generating any transaction status.
pub fn status_strategy() -> impl Strategy<Value = TxnStatus> {
    prop::sample::select(TxnStatus::ALL.to_vec())
}

/// Strategy for generating a crash scenario.
pub fn crash_point_strategy() -> impl Strategy<Value = CrashPoint> {
    prop::sample::select(CrashPoint::ALL.to_vec())
}

/// Strategy for generating logical names that a registry accepts.
pub fn file_name_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::string::string_regex("[a-z][a-z0-9_]{0,11}").expect("Invalid regex"),
        1..4,
    )
    .prop_map(|segments| segments.join("/"))
}

/// An operation on an active transactional file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    /// Stage new content.
    Write(Vec<u8>),
    /// Commit the staged content.
    Commit,
    /// Roll back to the content before the last commit.
    Rollback,
    /// Read the committed content.
    Read,
    /// Drop in-memory state and begin again over the same artifacts.
    Restart,
}

/// Strategy for generating file operations.
pub fn file_operation_strategy() -> impl Strategy<Value = FileOperation> {
    prop_oneof![
        4 => payload_strategy().prop_map(FileOperation::Write),
        3 => Just(FileOperation::Commit),
        2 => Just(FileOperation::Rollback),
        2 => Just(FileOperation::Read),
        1 => Just(FileOperation::Restart),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<FileOperation>> {
    prop::collection::vec(file_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

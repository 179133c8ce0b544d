//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::Rng;
use std::sync::Arc;
use txnfs_core::{ArtifactPaths, TransactionalFile, TxnStatus};
use txnfs_storage::InMemoryStore;

/// Generate random file content of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Open an in-memory file with a transaction begun.
pub fn active_memory_file() -> TransactionalFile {
    let mut file =
        TransactionalFile::with_store(ArtifactPaths::new("bench.bin"), Arc::new(InMemoryStore::new()));
    file.begin().unwrap();
    file
}

/// Encode a status log of `len` records cycling through a commit.
pub fn commit_cycle_log(len: usize) -> Vec<u8> {
    const CYCLE: [TxnStatus; 6] = [
        TxnStatus::Active,
        TxnStatus::Preparing,
        TxnStatus::Prepared,
        TxnStatus::Committing,
        TxnStatus::Committed,
        TxnStatus::Active,
    ];
    CYCLE
        .iter()
        .cycle()
        .take(len)
        .flat_map(|status| format!("{{\"txnStatus\":{}}}\n", status.code()).into_bytes())
        .collect()
}

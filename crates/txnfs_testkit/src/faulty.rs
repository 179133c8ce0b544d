//! Fault-injecting artifact store.
//!
//! [`FaultyStore`] wraps another store and simulates a process crash at a
//! chosen mutation: the N-th write, append, or remove of one artifact fails,
//! optionally after a prefix of its bytes reached the inner store (a torn
//! write). Once crashed, every later mutation fails as well, so nothing the
//! "dead" process does afterwards can leak into the artifacts. Reads keep
//! working.

use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use txnfs_storage::{ArtifactStore, StorageError, StorageResult};

/// Kind of mutation a fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOp {
    /// Whole-file replacement, including the write half of a copy.
    Write,
    /// Append to an existing or new file.
    Append,
    /// File removal.
    Remove,
}

/// Description of where the simulated crash happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Mutation kind to intercept.
    pub op: FaultOp,
    /// Artifact the mutation must target.
    pub target: PathBuf,
    /// Number of matching mutations allowed to succeed first.
    pub after: usize,
    /// Bytes of the failing mutation that still reach the inner store.
    pub torn_bytes: usize,
}

impl Fault {
    /// Crash on the first write to `target`.
    pub fn write(target: impl Into<PathBuf>) -> Self {
        Self::new(FaultOp::Write, target)
    }

    /// Crash on the first append to `target`.
    pub fn append(target: impl Into<PathBuf>) -> Self {
        Self::new(FaultOp::Append, target)
    }

    /// Crash on the first removal of `target`.
    pub fn remove(target: impl Into<PathBuf>) -> Self {
        Self::new(FaultOp::Remove, target)
    }

    fn new(op: FaultOp, target: impl Into<PathBuf>) -> Self {
        Self {
            op,
            target: target.into(),
            after: 0,
            torn_bytes: 0,
        }
    }

    /// Lets `count` matching mutations through before crashing.
    #[must_use]
    pub fn after(mut self, count: usize) -> Self {
        self.after = count;
        self
    }

    /// Lets the first `bytes` of the failing mutation reach the store.
    #[must_use]
    pub fn torn(mut self, bytes: usize) -> Self {
        self.torn_bytes = bytes;
        self
    }
}

enum Gate {
    Proceed,
    Crash { partial: usize },
}

/// A store wrapper that can simulate a crash at a chosen mutation.
pub struct FaultyStore {
    inner: Arc<dyn ArtifactStore>,
    fault: Mutex<Option<Fault>>,
    matched: AtomicUsize,
    crashed: AtomicBool,
}

impl FaultyStore {
    /// Wraps `inner` with no fault armed.
    pub fn new(inner: Arc<dyn ArtifactStore>) -> Self {
        Self {
            inner,
            fault: Mutex::new(None),
            matched: AtomicUsize::new(0),
            crashed: AtomicBool::new(false),
        }
    }

    /// Arms `fault`. Matching mutations are counted from this call on.
    pub fn arm(&self, fault: Fault) {
        *self.fault.lock() = Some(fault);
        self.matched.store(0, Ordering::SeqCst);
    }

    /// Disarms the fault and forgets any crash.
    pub fn reset(&self) {
        *self.fault.lock() = None;
        self.matched.store(0, Ordering::SeqCst);
        self.crashed.store(false, Ordering::SeqCst);
    }

    /// Returns whether the simulated crash has happened.
    pub fn has_crashed(&self) -> bool {
        self.crashed.load(Ordering::SeqCst)
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &Arc<dyn ArtifactStore> {
        &self.inner
    }

    fn gate(&self, op: FaultOp, path: &Path, len: usize) -> StorageResult<Gate> {
        if self.has_crashed() {
            return Err(crash_error("simulated crash: store is gone"));
        }

        let guard = self.fault.lock();
        let Some(fault) = guard
            .as_ref()
            .filter(|f| f.op == op && f.target.as_path() == path)
        else {
            return Ok(Gate::Proceed);
        };

        let seen = self.matched.fetch_add(1, Ordering::SeqCst);
        if seen < fault.after {
            return Ok(Gate::Proceed);
        }

        self.crashed.store(true, Ordering::SeqCst);
        Ok(Gate::Crash {
            partial: fault.torn_bytes.min(len),
        })
    }
}

fn crash_error(message: &str) -> StorageError {
    StorageError::Io(io::Error::other(message.to_string()))
}

impl ArtifactStore for FaultyStore {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn dir_exists(&self, path: &Path) -> bool {
        self.inner.dir_exists(path)
    }

    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        self.inner.read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        match self.gate(FaultOp::Write, path, data.len())? {
            Gate::Proceed => self.inner.write(path, data),
            Gate::Crash { partial } => {
                if partial > 0 {
                    let _ = self.inner.write(path, &data[..partial]);
                }
                Err(crash_error("simulated crash during write"))
            }
        }
    }

    fn append(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        match self.gate(FaultOp::Append, path, data.len())? {
            Gate::Proceed => self.inner.append(path, data),
            Gate::Crash { partial } => {
                if partial > 0 {
                    let _ = self.inner.append(path, &data[..partial]);
                }
                Err(crash_error("simulated crash during append"))
            }
        }
    }

    fn remove(&self, path: &Path) -> StorageResult<bool> {
        match self.gate(FaultOp::Remove, path, 0)? {
            Gate::Proceed => self.inner.remove(path),
            Gate::Crash { .. } => Err(crash_error("simulated crash during remove")),
        }
    }

    fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
        if self.has_crashed() {
            return Err(crash_error("simulated crash: store is gone"));
        }
        self.inner.create_dir_all(path)
    }
}

impl std::fmt::Debug for FaultyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultyStore")
            .field("fault", &*self.fault.lock())
            .field("crashed", &self.has_crashed())
            .finish_non_exhaustive()
    }
}

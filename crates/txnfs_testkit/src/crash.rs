//! Crash recovery testing for txnfs.
//!
//! The harness drives a real commit or rollback through a [`FaultyStore`],
//! crashes it at a chosen step, then "restarts" by opening a fresh
//! [`TransactionalFile`] over the surviving artifacts and checks what the
//! next `begin` recovers.
//!
//! ## Test Strategy
//!
//! Every scenario starts from a committed `BEFORE` and a staged `AFTER`.
//!
//! 1. **Crash before `COMMITTING` is durable** - the primary keeps `BEFORE`
//! 2. **Crash once `COMMITTING` is durable** - recovery redoes the commit
//! 3. **Crash once `ROLLING_BACK` is durable** - recovery redoes the rollback
//! 4. **Crash during recovery** - the next restart still converges
//!
//! Each scenario then restores the crashed artifacts, recovers them a
//! second time, and requires the same result.
//!
//! ## Usage
//!
//! ```rust
//! use txnfs_testkit::crash::{CrashPoint, CrashRecoveryHarness};
//!
//! let mut harness = CrashRecoveryHarness::in_memory();
//! let result = harness.run(CrashPoint::CommitBeforeCommittedRecord);
//! assert!(result.passed, "{:?}", result.error);
//! ```

use crate::faulty::{Fault, FaultyStore};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use txnfs_core::{ArtifactPaths, TransactionalFile, TxnResult};
use txnfs_storage::{ArtifactStore, FileStore, InMemoryStore, StorageResult};

/// Content committed before the crashing operation.
pub const BEFORE: &[u8] = b"committed before the crash";

/// Content staged, and for rollback scenarios committed, before the crash.
pub const AFTER: &[u8] = b"staged when the crash happened";

/// Operation interrupted by a crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `commit` of `AFTER` over `BEFORE`.
    Commit,
    /// `rollback` of a committed `AFTER` back to `BEFORE`.
    Rollback,
}

/// Points at which a crash can be simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashPoint {
    /// Appending `PREPARING` fails.
    CommitBeforePreparing,
    /// Snapshotting the primary into the rollback file is torn.
    CommitDuringSnapshot,
    /// Appending `COMMITTING` fails.
    CommitBeforeCommitting,
    /// Appending `COMMITTING` is torn mid-record.
    CommitTornCommittingRecord,
    /// Copying the dirty file over the primary is torn.
    CommitDuringPrimaryCopy,
    /// Appending `COMMITTED` fails after the primary was replaced.
    CommitBeforeCommittedRecord,
    /// Appending the final `ACTIVE` fails.
    CommitBeforeFinalActive,
    /// Removing the dirty file during recovery fails.
    CommitThenCrashDuringCleanup,
    /// The redo copy inside recovery fails, then a second restart recovers.
    CommitThenCrashDuringRedo,
    /// Appending `ROLLING_BACK` fails.
    RollbackBeforeRollingBack,
    /// Restoring the primary from the rollback file is torn.
    RollbackDuringRestore,
    /// Appending `ROLLEDBACK` fails after the primary was restored.
    RollbackBeforeRolledBackRecord,
    /// Appending the final `ACTIVE` fails.
    RollbackBeforeFinalActive,
}

impl CrashPoint {
    /// Every crash point, in protocol order.
    pub const ALL: [CrashPoint; 13] = [
        CrashPoint::CommitBeforePreparing,
        CrashPoint::CommitDuringSnapshot,
        CrashPoint::CommitBeforeCommitting,
        CrashPoint::CommitTornCommittingRecord,
        CrashPoint::CommitDuringPrimaryCopy,
        CrashPoint::CommitBeforeCommittedRecord,
        CrashPoint::CommitBeforeFinalActive,
        CrashPoint::CommitThenCrashDuringCleanup,
        CrashPoint::CommitThenCrashDuringRedo,
        CrashPoint::RollbackBeforeRollingBack,
        CrashPoint::RollbackDuringRestore,
        CrashPoint::RollbackBeforeRolledBackRecord,
        CrashPoint::RollbackBeforeFinalActive,
    ];

    /// Operation that is interrupted.
    pub fn operation(self) -> Operation {
        match self {
            CrashPoint::RollbackBeforeRollingBack
            | CrashPoint::RollbackDuringRestore
            | CrashPoint::RollbackBeforeRolledBackRecord
            | CrashPoint::RollbackBeforeFinalActive => Operation::Rollback,
            _ => Operation::Commit,
        }
    }

    /// Fault that interrupts the operation.
    ///
    /// Log appends are counted from the start of the operation: a commit
    /// appends `PREPARING`, `PREPARED`, `COMMITTING`, `COMMITTED`, `ACTIVE`;
    /// a rollback appends `ROLLING_BACK`, `ROLLEDBACK`, `ACTIVE`.
    pub fn fault(self, paths: &ArtifactPaths) -> Fault {
        let log = paths.log();
        match self {
            CrashPoint::CommitBeforePreparing => Fault::append(log),
            CrashPoint::CommitDuringSnapshot => Fault::write(paths.rollback()).torn(4),
            CrashPoint::CommitBeforeCommitting => Fault::append(log).after(2),
            CrashPoint::CommitTornCommittingRecord => Fault::append(log).after(2).torn(6),
            CrashPoint::CommitDuringPrimaryCopy => Fault::write(paths.primary()).torn(5),
            CrashPoint::CommitBeforeCommittedRecord
            | CrashPoint::CommitThenCrashDuringCleanup
            | CrashPoint::CommitThenCrashDuringRedo => Fault::append(log).after(3),
            CrashPoint::CommitBeforeFinalActive => Fault::append(log).after(4),
            CrashPoint::RollbackBeforeRollingBack => Fault::append(log),
            CrashPoint::RollbackDuringRestore => Fault::write(paths.primary()).torn(1),
            CrashPoint::RollbackBeforeRolledBackRecord => Fault::append(log).after(1),
            CrashPoint::RollbackBeforeFinalActive => Fault::append(log).after(2),
        }
    }

    /// Fault injected into the first restart, if the scenario crashes twice.
    pub fn recovery_fault(self, paths: &ArtifactPaths) -> Option<Fault> {
        match self {
            CrashPoint::CommitThenCrashDuringRedo => Some(Fault::write(paths.primary())),
            CrashPoint::CommitThenCrashDuringCleanup => Some(Fault::remove(paths.dirty())),
            _ => None,
        }
    }

    /// Primary content recovery must produce.
    pub fn expected(self) -> &'static [u8] {
        match self {
            CrashPoint::CommitBeforePreparing
            | CrashPoint::CommitDuringSnapshot
            | CrashPoint::CommitBeforeCommitting
            | CrashPoint::CommitTornCommittingRecord
            | CrashPoint::RollbackDuringRestore
            | CrashPoint::RollbackBeforeRolledBackRecord
            | CrashPoint::RollbackBeforeFinalActive => BEFORE,
            CrashPoint::CommitDuringPrimaryCopy
            | CrashPoint::CommitBeforeCommittedRecord
            | CrashPoint::CommitBeforeFinalActive
            | CrashPoint::CommitThenCrashDuringCleanup
            | CrashPoint::CommitThenCrashDuringRedo
            | CrashPoint::RollbackBeforeRollingBack => AFTER,
        }
    }

    /// Human-readable scenario description.
    pub fn description(self) -> &'static str {
        match self {
            CrashPoint::CommitBeforePreparing => "crash before PREPARING keeps old content",
            CrashPoint::CommitDuringSnapshot => "torn snapshot keeps old content",
            CrashPoint::CommitBeforeCommitting => "crash before COMMITTING keeps old content",
            CrashPoint::CommitTornCommittingRecord => {
                "torn COMMITTING record falls back to PREPARED"
            }
            CrashPoint::CommitDuringPrimaryCopy => "torn primary copy is redone",
            CrashPoint::CommitBeforeCommittedRecord => "crash after COMMITTING is redone",
            CrashPoint::CommitBeforeFinalActive => "crash after COMMITTED keeps new content",
            CrashPoint::CommitThenCrashDuringCleanup => "crash during recovery cleanup converges",
            CrashPoint::CommitThenCrashDuringRedo => "crash during recovery redo converges",
            CrashPoint::RollbackBeforeRollingBack => {
                "crash before ROLLING_BACK keeps committed content"
            }
            CrashPoint::RollbackDuringRestore => "torn restore is redone",
            CrashPoint::RollbackBeforeRolledBackRecord => "crash after ROLLING_BACK is redone",
            CrashPoint::RollbackBeforeFinalActive => "crash after ROLLEDBACK keeps old content",
        }
    }
}

/// Result of a crash recovery test.
#[derive(Debug, Clone)]
pub struct CrashRecoveryResult {
    /// Scenario that was run.
    pub point: CrashPoint,
    /// Whether the test passed.
    pub passed: bool,
    /// Description of what was tested.
    pub description: String,
    /// Expected primary content after recovery.
    pub expected: Vec<u8>,
    /// Actual primary content after recovery, if it could be read.
    pub actual: Option<Vec<u8>>,
    /// Any error message.
    pub error: Option<String>,
}

impl CrashRecoveryResult {
    /// Creates a passing result.
    pub fn pass(point: CrashPoint) -> Self {
        Self {
            point,
            passed: true,
            description: point.description().to_string(),
            expected: point.expected().to_vec(),
            actual: Some(point.expected().to_vec()),
            error: None,
        }
    }

    /// Creates a failing result.
    pub fn fail(point: CrashPoint, actual: Option<Vec<u8>>, error: &str) -> Self {
        Self {
            point,
            passed: false,
            description: point.description().to_string(),
            expected: point.expected().to_vec(),
            actual,
            error: Some(error.to_string()),
        }
    }
}

/// Bytes of every artifact at one instant, `None` where a file is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSnapshot {
    /// Primary file.
    pub primary: Option<Vec<u8>>,
    /// Dirty file.
    pub dirty: Option<Vec<u8>>,
    /// Rollback file.
    pub rollback: Option<Vec<u8>>,
    /// Status log.
    pub log: Option<Vec<u8>>,
}

impl ArtifactSnapshot {
    /// Captures the artifacts of `paths` from `store`.
    pub fn capture(store: &dyn ArtifactStore, paths: &ArtifactPaths) -> StorageResult<Self> {
        let read = |path: &Path| -> StorageResult<Option<Vec<u8>>> {
            if store.exists(path) {
                store.read(path).map(Some)
            } else {
                Ok(None)
            }
        };
        Ok(Self {
            primary: read(paths.primary())?,
            dirty: read(paths.dirty())?,
            rollback: read(paths.rollback())?,
            log: read(paths.log())?,
        })
    }

    /// Writes the captured artifacts back, removing the absent ones.
    pub fn restore(&self, store: &dyn ArtifactStore, paths: &ArtifactPaths) -> StorageResult<()> {
        let entries = [
            (paths.primary(), &self.primary),
            (paths.dirty(), &self.dirty),
            (paths.rollback(), &self.rollback),
            (paths.log(), &self.log),
        ];
        for (path, content) in entries {
            match content {
                Some(bytes) => store.write(path, bytes)?,
                None => {
                    store.remove(path)?;
                }
            }
        }
        Ok(())
    }
}

/// Test harness for crash recovery scenarios.
pub struct CrashRecoveryHarness {
    store: Arc<dyn ArtifactStore>,
    paths: ArtifactPaths,
    /// Results of crash recovery tests.
    pub results: Vec<CrashRecoveryResult>,
    _temp_dir: Option<TempDir>,
}

impl CrashRecoveryHarness {
    /// Creates a harness over an explicit store and file.
    pub fn new(store: Arc<dyn ArtifactStore>, paths: ArtifactPaths) -> Self {
        Self {
            store,
            paths,
            results: Vec::new(),
            _temp_dir: None,
        }
    }

    /// Creates a harness over an in-memory store.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryStore::new()),
            ArtifactPaths::new("crash.bin"),
        )
    }

    /// Creates a harness over the OS filesystem in a temporary directory.
    pub fn with_temp_dir() -> std::io::Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let mut harness = Self::new(
            Arc::new(FileStore::new()),
            ArtifactPaths::new(temp_dir.path().join("crash.bin")),
        );
        harness._temp_dir = Some(temp_dir);
        Ok(harness)
    }

    /// Returns the artifact paths under test.
    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Runs one crash scenario and records its result.
    pub fn run(&mut self, point: CrashPoint) -> CrashRecoveryResult {
        let result = match self.run_scenario(point) {
            Ok(actual) if actual == point.expected() => CrashRecoveryResult::pass(point),
            Ok(actual) => CrashRecoveryResult::fail(
                point,
                Some(actual),
                "recovered content does not match",
            ),
            Err(err) => CrashRecoveryResult::fail(point, None, &err),
        };

        self.results.push(result.clone());
        result
    }

    /// Runs every crash scenario.
    pub fn run_all(&mut self) -> Vec<CrashRecoveryResult> {
        CrashPoint::ALL.iter().map(|point| self.run(*point)).collect()
    }

    /// Returns a summary of all results.
    pub fn summary(&self) -> String {
        let passed = self.results.iter().filter(|r| r.passed).count();
        let mut summary = format!(
            "Crash Recovery Tests: {}/{} passed\n",
            passed,
            self.results.len()
        );
        for result in &self.results {
            let status = if result.passed { "PASS" } else { "FAIL" };
            summary.push_str(&format!("  [{}] {}", status, result.description));
            if let Some(error) = &result.error {
                summary.push_str(&format!(" - {}", error));
            }
            summary.push('\n');
        }
        summary
    }

    /// Returns whether all recorded tests passed.
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    fn run_scenario(&self, point: CrashPoint) -> Result<Vec<u8>, String> {
        self.clear().map_err(|e| format!("clearing artifacts: {e}"))?;

        let faulty = Arc::new(FaultyStore::new(Arc::clone(&self.store)));
        let mut file = TransactionalFile::with_store(self.paths.clone(), faulty.clone());
        self.stage(&mut file, point.operation())
            .map_err(|e| format!("staging: {e}"))?;

        faulty.arm(point.fault(&self.paths));
        let interrupted = match point.operation() {
            Operation::Commit => file.commit(),
            Operation::Rollback => file.rollback(),
        };
        if interrupted.is_ok() || !faulty.has_crashed() {
            return Err("crash point was never reached".to_string());
        }
        drop(file);

        if let Some(fault) = point.recovery_fault(&self.paths) {
            let faulty = Arc::new(FaultyStore::new(Arc::clone(&self.store)));
            faulty.arm(fault);
            let mut restarted = TransactionalFile::with_store(self.paths.clone(), faulty.clone());
            if restarted.begin().is_ok() || !faulty.has_crashed() {
                return Err("recovery crash point was never reached".to_string());
            }
        }

        let crashed = ArtifactSnapshot::capture(&*self.store, &self.paths)
            .map_err(|e| format!("capturing artifacts: {e}"))?;

        let first = self.restart().map_err(|e| format!("first restart: {e}"))?;

        crashed
            .restore(&*self.store, &self.paths)
            .map_err(|e| format!("restoring artifacts: {e}"))?;
        let second = self.restart().map_err(|e| format!("second restart: {e}"))?;

        if first != second {
            return Err("recovery is not idempotent".to_string());
        }
        Ok(first)
    }

    /// Leaves `BEFORE` committed and `AFTER` staged, or for rollback
    /// scenarios `AFTER` committed over `BEFORE`.
    fn stage(&self, file: &mut TransactionalFile, operation: Operation) -> TxnResult<()> {
        file.begin()?;
        file.write_file(BEFORE)?;
        file.commit()?;
        file.write_file(AFTER)?;
        if operation == Operation::Rollback {
            file.commit()?;
        }
        Ok(())
    }

    fn restart(&self) -> TxnResult<Vec<u8>> {
        let mut file = TransactionalFile::with_store(self.paths.clone(), Arc::clone(&self.store));
        file.begin()?;
        file.read_file()
    }

    fn clear(&self) -> StorageResult<()> {
        for path in [
            self.paths.primary(),
            self.paths.dirty(),
            self.paths.rollback(),
            self.paths.log(),
        ] {
            self.store.remove(path)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for CrashRecoveryHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrashRecoveryHarness")
            .field("paths", &self.paths)
            .field("results", &self.results.len())
            .finish_non_exhaustive()
    }
}

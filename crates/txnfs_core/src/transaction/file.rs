//! Transactional file state machine.

use super::recovery::RecoveryReport;
use super::status::TxnStatus;
use crate::error::{TxnError, TxnResult};
use crate::paths::ArtifactPaths;
use crate::wal::StatusLog;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};
use txnfs_storage::{ArtifactStore, FileStore};

/// How a status transition is written to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LogMode {
    /// Truncate the log and start a fresh record sequence.
    Reset,
    /// Add a record to the current sequence.
    Append,
}

/// Crash-recoverable transactions over one primary file.
///
/// One instance exists per absolute path (see [`crate::TxnFileRegistry`]).
/// All operations are synchronous and run to completion or return an error.
/// There is no internal locking: mutating operations take `&mut self`, and
/// two processes driving the same path concurrently is unsupported.
///
/// # Semantics
///
/// - Reads return the last committed content, never staged writes
/// - Writes go to the dirty file only; `commit` makes them durable
/// - After `commit` or `rollback` the status returns to `ACTIVE`, so
///   transactions chain without another `begin`
/// - `rollback` undoes the most recent commit attempt; writes staged before
///   any commit was ever attempted are not reverted
///
/// # Example
///
/// ```rust
/// use txnfs_core::{TransactionalFile, TxnStatus};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut file = TransactionalFile::new(dir.path().join("nested/data.bin"));
///
/// file.begin().unwrap();
/// file.write_file(&[1, 2, 3]).unwrap();
/// file.commit().unwrap();
///
/// file.write_file(&[4, 5, 6]).unwrap();
/// file.commit().unwrap();
/// assert_eq!(file.read_file().unwrap(), vec![4, 5, 6]);
///
/// file.rollback().unwrap();
/// assert_eq!(file.read_file().unwrap(), vec![1, 2, 3]);
/// assert_eq!(file.status(), TxnStatus::Active);
/// ```
pub struct TransactionalFile {
    /// Primary, dirty, rollback, and log paths.
    pub(super) paths: ArtifactPaths,
    /// Store every artifact is read from and written to.
    pub(super) store: Arc<dyn ArtifactStore>,
    /// Status log writer.
    pub(super) log: StatusLog,
    /// Current in-memory status.
    pub(super) status: TxnStatus,
    /// Blocks `commit` after a failure until `rollback` completes.
    pub(super) rollback_only: bool,
    /// Outcome of the most recent recovery run.
    pub(super) last_recovery: Option<RecoveryReport>,
}

impl TransactionalFile {
    /// Creates a handle for `primary` backed by the OS filesystem.
    ///
    /// Nothing is touched on disk until [`begin`](Self::begin).
    #[must_use]
    pub fn new(primary: impl Into<PathBuf>) -> Self {
        Self::with_store(ArtifactPaths::new(primary), Arc::new(FileStore::new()))
    }

    /// Creates a handle over explicit artifact paths and store.
    #[must_use]
    pub fn with_store(paths: ArtifactPaths, store: Arc<dyn ArtifactStore>) -> Self {
        let log = StatusLog::new(paths.log(), Arc::clone(&store));
        Self {
            paths,
            store,
            log,
            status: TxnStatus::NoTransaction,
            rollback_only: false,
            last_recovery: None,
        }
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> TxnStatus {
        self.status
    }

    /// Returns true if commits are blocked until the next rollback.
    #[must_use]
    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only
    }

    /// Returns the artifact paths.
    #[must_use]
    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Returns the report of the recovery run by the last `begin`, if any.
    #[must_use]
    pub fn last_recovery(&self) -> Option<&RecoveryReport> {
        self.last_recovery.as_ref()
    }

    /// Starts a transaction.
    ///
    /// If a status log exists, recovery runs first and repairs the artifacts
    /// left by any interrupted commit or rollback. A missing primary file is
    /// created empty, together with its parent directories. The primary is
    /// then copied into the dirty file and the status becomes `ACTIVE`.
    ///
    /// # Errors
    ///
    /// - [`TxnError::InvalidState`] unless the status is `NO_TRANSACTION`
    /// - Any storage error from recovery or from preparing the artifacts;
    ///   the transaction is not started
    pub fn begin(&mut self) -> TxnResult<()> {
        if self.status != TxnStatus::NoTransaction {
            return Err(TxnError::invalid_state(
                "begin",
                self.status,
                "transaction already active",
            ));
        }

        if self.log.exists() {
            let report = self.recover()?;
            self.last_recovery = Some(report);
        }

        let primary = self.paths.primary();
        if !self.store.exists(primary) {
            if let Some(parent) = primary.parent().filter(|p| !p.as_os_str().is_empty()) {
                self.store.create_dir_all(parent)?;
            }
            self.store.write(primary, &[])?;
            debug!(path = %primary.display(), "created empty primary file");
        }

        self.store.copy(primary, self.paths.dirty())?;
        if let Err(err) = self.transition(TxnStatus::Active, LogMode::Reset) {
            self.status = TxnStatus::NoTransaction;
            return Err(err);
        }
        Ok(())
    }

    /// Returns the committed content of the primary file.
    ///
    /// Staged writes are not visible until committed.
    ///
    /// # Errors
    ///
    /// - [`TxnError::InvalidState`] unless the status is `ACTIVE`
    /// - A storage error if the primary cannot be read
    pub fn read_file(&self) -> TxnResult<Vec<u8>> {
        self.ensure_active("read")?;
        Ok(self.store.read(self.paths.primary())?)
    }

    /// Stages `data` as the next content of the file.
    ///
    /// Only the dirty file is written. Nothing is logged; `commit` is what
    /// makes the write durable.
    ///
    /// # Errors
    ///
    /// - [`TxnError::InvalidState`] unless the status is `ACTIVE`
    /// - A storage error if the dirty file cannot be written
    pub fn write_file(&mut self, data: &[u8]) -> TxnResult<()> {
        self.ensure_active("write")?;
        self.store.write(self.paths.dirty(), data)?;
        Ok(())
    }

    /// Commits the staged content.
    ///
    /// Protocol, each status logged before the next step:
    ///
    /// 1. `PREPARING`
    /// 2. snapshot primary into the rollback file
    /// 3. `PREPARED`
    /// 4. `COMMITTING`
    /// 5. copy the dirty file over the primary
    /// 6. `COMMITTED`
    /// 7. `ACTIVE`
    ///
    /// # Errors
    ///
    /// - [`TxnError::InvalidState`] if the status is `COMMITTING`,
    ///   `NO_TRANSACTION`, `MARKED_ROLLBACK`, `ROLLING_BACK`, or `UNKNOWN`,
    ///   or if the transaction is rollback-only
    /// - Any storage error during the protocol. The transaction becomes
    ///   rollback-only and the primary's state is uncertain: call
    ///   [`rollback`](Self::rollback) before writing again.
    pub fn commit(&mut self) -> TxnResult<()> {
        self.check_commit()?;

        if let Err(err) = self.apply_commit() {
            self.set_rollback_only();
            warn!(
                path = %self.paths.primary().display(),
                status = %self.status,
                error = %err,
                "commit failed, transaction is rollback-only"
            );
            return Err(err);
        }

        debug!(path = %self.paths.primary().display(), "commit complete");
        Ok(())
    }

    /// Restores the primary to its content before the last commit attempt.
    ///
    /// Protocol: `ROLLING_BACK`, copy the rollback file (if any) over the
    /// primary, `ROLLEDBACK`, `ACTIVE`. Completing a rollback clears the
    /// rollback-only flag.
    ///
    /// # Errors
    ///
    /// - [`TxnError::InvalidState`] if the status is `NO_TRANSACTION`,
    ///   `COMMITTED`, `ROLLEDBACK`, `ROLLING_BACK`, or `UNKNOWN`
    /// - Any storage error during the protocol; the next `begin` after a
    ///   restart redoes the rollback
    pub fn rollback(&mut self) -> TxnResult<()> {
        if !self.status.can_roll_back() {
            return Err(TxnError::invalid_state(
                "roll back",
                self.status,
                "cannot roll back from this state",
            ));
        }

        self.transition(TxnStatus::RollingBack, LogMode::Append)?;
        let restored = self
            .store
            .copy(self.paths.rollback(), self.paths.primary())?;
        self.transition(TxnStatus::RolledBack, LogMode::Append)?;
        self.rollback_only = false;
        self.transition(TxnStatus::Active, LogMode::Append)?;

        debug!(path = %self.paths.primary().display(), restored, "rollback complete");
        Ok(())
    }

    /// Marks the transaction rollback-only.
    ///
    /// Latches the flag in `ACTIVE`, `PREPARING`, `PREPARED`, `COMMITTED`,
    /// and `COMMITTING`; clears it in every other status. Idempotent, and
    /// never logged.
    pub fn set_rollback_only(&mut self) {
        self.rollback_only = self.status.allows_rollback_only();
    }

    /// Moves to `status` and records it in the log.
    pub(super) fn transition(&mut self, status: TxnStatus, mode: LogMode) -> TxnResult<()> {
        debug!(
            path = %self.paths.primary().display(),
            from = %self.status,
            to = %status,
            "status transition"
        );
        self.status = status;
        match mode {
            LogMode::Reset => self.log.reset(status),
            LogMode::Append => self.log.append(status),
        }
    }

    fn ensure_active(&self, operation: &'static str) -> TxnResult<()> {
        if self.status == TxnStatus::Active {
            return Ok(());
        }
        Err(TxnError::invalid_state(
            operation,
            self.status,
            "begin a transaction or complete earlier transactions",
        ))
    }

    fn check_commit(&self) -> TxnResult<()> {
        let message = match self.status {
            TxnStatus::Committing => "already committing",
            TxnStatus::NoTransaction => "not active",
            TxnStatus::MarkedRollback | TxnStatus::RollingBack => "already rolling back",
            TxnStatus::Unknown => "unknown state",
            _ if self.rollback_only => "rollback-only",
            _ => return Ok(()),
        };
        Err(TxnError::invalid_state("commit", self.status, message))
    }

    fn apply_commit(&mut self) -> TxnResult<()> {
        self.transition(TxnStatus::Preparing, LogMode::Append)?;
        self.store
            .copy(self.paths.primary(), self.paths.rollback())?;
        self.transition(TxnStatus::Prepared, LogMode::Append)?;

        self.transition(TxnStatus::Committing, LogMode::Append)?;
        self.store.copy(self.paths.dirty(), self.paths.primary())?;
        self.transition(TxnStatus::Committed, LogMode::Append)?;

        self.transition(TxnStatus::Active, LogMode::Append)
    }
}

impl std::fmt::Debug for TransactionalFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionalFile")
            .field("paths", &self.paths)
            .field("status", &self.status)
            .field("rollback_only", &self.rollback_only)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::scan;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;
    use txnfs_storage::{InMemoryStore, StorageError, StorageResult};

    /// Store that fails writes to one path while armed.
    struct FailingStore {
        inner: InMemoryStore,
        target: PathBuf,
        armed: AtomicBool,
    }

    impl FailingStore {
        fn new(target: &Path) -> Self {
            Self {
                inner: InMemoryStore::new(),
                target: target.to_path_buf(),
                armed: AtomicBool::new(false),
            }
        }

        fn arm(&self, armed: bool) {
            self.armed.store(armed, Ordering::SeqCst);
        }
    }

    impl ArtifactStore for FailingStore {
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
            if self.armed.load(Ordering::SeqCst) && path == self.target {
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }
            self.inner.write(path, data)
        }

        fn append(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
            self.inner.append(path, data)
        }

        fn remove(&self, path: &Path) -> StorageResult<bool> {
            self.inner.remove(path)
        }

        fn create_dir_all(&self, path: &Path) -> StorageResult<()> {
            self.inner.create_dir_all(path)
        }
    }

    fn memory_file() -> (TransactionalFile, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let file = TransactionalFile::with_store(ArtifactPaths::new("data.bin"), store.clone());
        (file, store)
    }

    fn logged(store: &InMemoryStore, file: &TransactionalFile) -> Vec<TxnStatus> {
        scan(&store.read(file.paths().log()).unwrap()).statuses
    }

    #[test]
    fn new_file_has_no_transaction() {
        let (file, store) = memory_file();
        assert_eq!(file.status(), TxnStatus::NoTransaction);
        assert!(!file.is_rollback_only());
        assert!(file.last_recovery().is_none());
        assert!(store.files().is_empty());
    }

    #[test]
    fn begin_creates_primary_and_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("data.bin");
        let mut file = TransactionalFile::new(&path);

        file.begin().unwrap();

        assert!(path.is_file());
        assert!(file.paths().dirty().is_file());
        assert_eq!(file.status(), TxnStatus::Active);
        assert!(file.read_file().unwrap().is_empty());
    }

    #[test]
    fn begin_twice_is_rejected() {
        let (mut file, _) = memory_file();
        file.begin().unwrap();

        let err = file.begin().unwrap_err();
        assert!(err.is_invalid_state());
        assert!(err.to_string().contains("transaction already active"));
    }

    #[test]
    fn begin_resets_log() {
        let (mut file, store) = memory_file();
        file.begin().unwrap();
        assert_eq!(logged(&store, &file), vec![TxnStatus::Active]);
    }

    #[test]
    fn read_and_write_require_begin() {
        let (mut file, _) = memory_file();

        assert!(file.read_file().unwrap_err().is_invalid_state());
        assert!(file.write_file(b"x").unwrap_err().is_invalid_state());
    }

    #[test]
    fn write_then_commit_then_read() {
        let (mut file, _) = memory_file();
        file.begin().unwrap();
        file.write_file(&[1, 2, 3]).unwrap();
        file.commit().unwrap();

        assert_eq!(file.read_file().unwrap(), vec![1, 2, 3]);
        assert_eq!(file.status(), TxnStatus::Active);
    }

    #[test]
    fn reads_do_not_see_staged_writes() {
        let (mut file, store) = memory_file();
        file.begin().unwrap();
        file.write_file(b"staged").unwrap();

        assert!(file.read_file().unwrap().is_empty());
        assert_eq!(store.read(file.paths().dirty()).unwrap(), b"staged");
    }

    #[test]
    fn commit_logs_every_step() {
        let (mut file, store) = memory_file();
        file.begin().unwrap();
        file.write_file(b"x").unwrap();
        file.commit().unwrap();

        assert_eq!(
            logged(&store, &file),
            vec![
                TxnStatus::Active,
                TxnStatus::Preparing,
                TxnStatus::Prepared,
                TxnStatus::Committing,
                TxnStatus::Committed,
                TxnStatus::Active,
            ]
        );
    }

    #[test]
    fn commit_snapshots_previous_content() {
        let (mut file, store) = memory_file();
        file.begin().unwrap();
        file.write_file(b"first").unwrap();
        file.commit().unwrap();
        file.write_file(b"second").unwrap();
        file.commit().unwrap();

        assert_eq!(store.read(file.paths().rollback()).unwrap(), b"first");
        assert_eq!(file.read_file().unwrap(), b"second");
    }

    #[test]
    fn commit_twice_succeeds() {
        let (mut file, _) = memory_file();
        file.begin().unwrap();
        file.write_file(b"one").unwrap();
        file.commit().unwrap();
        file.commit().unwrap();

        assert_eq!(file.read_file().unwrap(), b"one");
        assert_eq!(file.status(), TxnStatus::Active);
    }

    #[test]
    fn commit_without_begin_is_rejected() {
        let (mut file, store) = memory_file();
        let err = file.commit().unwrap_err();

        assert!(err.to_string().contains("not active"));
        assert!(store.files().is_empty());
    }

    #[test]
    fn commit_rejected_when_rollback_only() {
        let (mut file, _) = memory_file();
        file.begin().unwrap();
        file.set_rollback_only();

        let err = file.commit().unwrap_err();
        assert!(err.to_string().contains("rollback-only"));
    }

    #[test]
    fn rollback_discards_write_after_commit() {
        let (mut file, store) = memory_file();
        store.write(Path::new("data.bin"), b"kept").unwrap();
        file.begin().unwrap();
        file.commit().unwrap();
        file.write_file(b"discarded").unwrap();
        file.rollback().unwrap();

        assert_eq!(file.read_file().unwrap(), b"kept");
    }

    #[test]
    fn rollback_reverts_last_commit() {
        let (mut file, _) = memory_file();
        file.begin().unwrap();
        file.write_file(b"v1").unwrap();
        file.commit().unwrap();
        file.write_file(b"v2").unwrap();
        file.commit().unwrap();
        file.rollback().unwrap();

        assert_eq!(file.read_file().unwrap(), b"v1");
    }

    #[test]
    fn rollback_before_any_commit_keeps_primary() {
        let (mut file, store) = memory_file();
        store.write(Path::new("data.bin"), b"original").unwrap();
        file.begin().unwrap();
        file.write_file(b"staged").unwrap();
        file.rollback().unwrap();

        assert_eq!(file.read_file().unwrap(), b"original");
        // The staged write survives in the dirty file
        assert_eq!(store.read(file.paths().dirty()).unwrap(), b"staged");
    }

    #[test]
    fn rollback_logs_every_step() {
        let (mut file, store) = memory_file();
        file.begin().unwrap();
        file.rollback().unwrap();

        assert_eq!(
            logged(&store, &file),
            vec![
                TxnStatus::Active,
                TxnStatus::RollingBack,
                TxnStatus::RolledBack,
                TxnStatus::Active,
            ]
        );
    }

    #[test]
    fn rollback_without_begin_is_rejected() {
        let (mut file, _) = memory_file();
        let err = file.rollback().unwrap_err();
        assert!(err.to_string().contains("cannot roll back from this state"));
    }

    #[test]
    fn set_rollback_only_depends_on_status() {
        let (mut file, _) = memory_file();
        file.set_rollback_only();
        assert!(!file.is_rollback_only());

        file.begin().unwrap();
        file.set_rollback_only();
        file.set_rollback_only();
        assert!(file.is_rollback_only());
    }

    #[test]
    fn failed_commit_copy_sets_rollback_only() {
        let store = Arc::new(FailingStore::new(Path::new("data.bin")));
        let mut file =
            TransactionalFile::with_store(ArtifactPaths::new("data.bin"), store.clone());

        file.begin().unwrap();
        file.write_file(b"v1").unwrap();
        file.commit().unwrap();
        file.write_file(b"v2").unwrap();

        store.arm(true);
        let err = file.commit().unwrap_err();
        assert!(err.is_io());
        assert!(file.is_rollback_only());
        assert_eq!(file.status(), TxnStatus::Committing);

        // Retrying the commit is refused
        let err = file.commit().unwrap_err();
        assert!(err.is_invalid_state());

        store.arm(false);
        file.rollback().unwrap();
        assert!(!file.is_rollback_only());
        assert_eq!(file.read_file().unwrap(), b"v1");

        // Commits work again after the rollback
        file.write_file(b"v3").unwrap();
        file.commit().unwrap();
        assert_eq!(file.read_file().unwrap(), b"v3");
    }

    #[test]
    fn failed_log_reset_does_not_start_transaction() {
        let store = Arc::new(FailingStore::new(Path::new("data.bin.txn.log")));
        let mut file =
            TransactionalFile::with_store(ArtifactPaths::new("data.bin"), store.clone());

        store.arm(true);
        assert!(file.begin().unwrap_err().is_io());
        assert_eq!(file.status(), TxnStatus::NoTransaction);
        assert!(file.write_file(b"x").unwrap_err().is_invalid_state());
        assert!(file.commit().unwrap_err().is_invalid_state());

        store.arm(false);
        file.begin().unwrap();
        assert_eq!(file.status(), TxnStatus::Active);
    }

    fn rejection(result: TxnResult<()>) -> (&'static str, String) {
        match result {
            Err(TxnError::InvalidState {
                operation, message, ..
            }) => (operation, message),
            other => panic!("expected an invalid state error, got {other:?}"),
        }
    }

    #[test]
    fn commit_preconditions_in_order() {
        let cases = [
            (TxnStatus::Committing, false, "already committing"),
            (TxnStatus::Committing, true, "already committing"),
            (TxnStatus::NoTransaction, false, "not active"),
            (TxnStatus::NoTransaction, true, "not active"),
            (TxnStatus::MarkedRollback, false, "already rolling back"),
            (TxnStatus::RollingBack, false, "already rolling back"),
            (TxnStatus::RollingBack, true, "already rolling back"),
            (TxnStatus::Unknown, false, "unknown state"),
            (TxnStatus::Unknown, true, "unknown state"),
            (TxnStatus::Active, true, "rollback-only"),
            (TxnStatus::Prepared, true, "rollback-only"),
            (TxnStatus::Committed, true, "rollback-only"),
        ];

        for (status, rollback_only, expected) in cases {
            let (mut file, store) = memory_file();
            file.status = status;
            file.rollback_only = rollback_only;

            let (operation, message) = rejection(file.commit());
            assert_eq!(operation, "commit");
            assert_eq!(message, expected, "commit from {status} (rollback-only: {rollback_only})");
            assert_eq!(file.status(), status);
            assert!(store.files().is_empty(), "commit from {status} touched the store");
        }
    }

    #[test]
    fn rollback_rejected_statuses() {
        for status in [
            TxnStatus::NoTransaction,
            TxnStatus::Committed,
            TxnStatus::RolledBack,
            TxnStatus::RollingBack,
            TxnStatus::Unknown,
        ] {
            let (mut file, store) = memory_file();
            file.status = status;

            let (operation, message) = rejection(file.rollback());
            assert_eq!(operation, "roll back");
            assert_eq!(message, "cannot roll back from this state", "rollback from {status}");
            assert_eq!(file.status(), status);
            assert!(store.files().is_empty(), "rollback from {status} touched the store");
        }
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.bin");

        let mut file = TransactionalFile::new(&path);
        file.begin().unwrap();
        file.write_file(b"on disk").unwrap();
        file.commit().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"on disk");
        let log = std::fs::read_to_string(file.paths().log()).unwrap();
        assert!(log.ends_with("{\"txnStatus\":0}\n"));
    }
}

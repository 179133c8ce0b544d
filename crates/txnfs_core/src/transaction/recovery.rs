//! Crash recovery.
//!
//! Recovery runs inside `begin` whenever a status log exists. It reads the
//! last readable status record and repairs the primary accordingly:
//!
//! | recovered status | repair |
//! |------------------|--------|
//! | `COMMITTING`     | redo: copy dirty → primary |
//! | `ROLLING_BACK`   | redo: copy rollback → primary (if present) |
//! | anything else    | none |
//!
//! Afterwards the log is reset to `NO_TRANSACTION` and the dirty and
//! rollback files are removed. Running recovery again on the same artifacts
//! converges to the same primary content.

use super::file::{LogMode, TransactionalFile};
use super::status::TxnStatus;
use crate::error::TxnResult;
use tracing::{info, warn};

/// Repair performed by a recovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// The last transition needed no repair.
    None,
    /// An interrupted commit was re-applied.
    RedoCommit {
        /// Whether a dirty file existed to copy.
        applied: bool,
    },
    /// An interrupted rollback was re-applied.
    RedoRollback {
        /// Whether a rollback file existed to copy.
        applied: bool,
    },
}

/// Outcome of one recovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Status read from the log.
    pub recovered_status: TxnStatus,
    /// Repair that was performed.
    pub action: RecoveryAction,
    /// Number of unreadable log records that were ignored.
    pub skipped_records: usize,
}

impl TransactionalFile {
    /// Replays the status log and leaves the file in `NO_TRANSACTION`.
    ///
    /// If redoing an interrupted commit fails, the status stays
    /// `COMMITTING`, the transaction becomes rollback-only, and the error is
    /// returned; the caller should `rollback`. Any other failure puts the
    /// in-memory status back to `NO_TRANSACTION` without touching the log,
    /// so the next `begin` retries recovery from the same durable state.
    pub(super) fn recover(&mut self) -> TxnResult<RecoveryReport> {
        let scan = self.log.scan()?;
        let recovered_status = scan.recovered_status();
        self.status = recovered_status;

        let action = match recovered_status {
            TxnStatus::Committing => {
                match self.store.copy(self.paths.dirty(), self.paths.primary()) {
                    Ok(applied) => RecoveryAction::RedoCommit { applied },
                    Err(err) => {
                        self.set_rollback_only();
                        warn!(
                            path = %self.paths.primary().display(),
                            error = %err,
                            "redo of interrupted commit failed, transaction is rollback-only"
                        );
                        return Err(err.into());
                    }
                }
            }
            TxnStatus::RollingBack => {
                match self.store.copy(self.paths.rollback(), self.paths.primary()) {
                    Ok(applied) => RecoveryAction::RedoRollback { applied },
                    Err(err) => {
                        self.status = TxnStatus::NoTransaction;
                        return Err(err.into());
                    }
                }
            }
            _ => RecoveryAction::None,
        };

        if let Err(err) = self.finish_recovery() {
            self.status = TxnStatus::NoTransaction;
            return Err(err);
        }

        let report = RecoveryReport {
            recovered_status,
            action,
            skipped_records: scan.skipped,
        };
        info!(
            path = %self.paths.primary().display(),
            recovered = %report.recovered_status,
            action = ?report.action,
            skipped = report.skipped_records,
            "recovered transactional file"
        );
        Ok(report)
    }

    fn finish_recovery(&mut self) -> TxnResult<()> {
        self.transition(TxnStatus::NoTransaction, LogMode::Reset)?;
        self.store.remove(self.paths.dirty())?;
        self.store.remove(self.paths.rollback())?;
        Ok(())
    }
}

//! Transaction status.

use std::fmt;

/// Status of a transactional file.
///
/// The status lives in memory as this enum. It is persisted only through
/// the status log, where each variant is written as a fixed integer code
/// (see [`TxnStatus::code`]). The codes are a compatibility contract: a log
/// written by one version must be recoverable by another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxnStatus {
    /// A transaction is open; reads and writes are allowed.
    Active,
    /// Flagged for rollback. Reachable only through recovery or flagging.
    MarkedRollback,
    /// Rollback snapshot taken; about to start copying.
    Prepared,
    /// Commit copy finished.
    Committed,
    /// Rollback copy finished.
    RolledBack,
    /// Status could not be determined from the log.
    Unknown,
    /// No transaction has been started.
    NoTransaction,
    /// Commit started; rollback snapshot not yet taken.
    Preparing,
    /// Dirty file is being copied over the primary.
    Committing,
    /// Rollback snapshot is being copied over the primary.
    RollingBack,
}

impl TxnStatus {
    /// All statuses, in code order.
    pub const ALL: [TxnStatus; 10] = [
        Self::Active,
        Self::MarkedRollback,
        Self::Prepared,
        Self::Committed,
        Self::RolledBack,
        Self::Unknown,
        Self::NoTransaction,
        Self::Preparing,
        Self::Committing,
        Self::RollingBack,
    ];

    /// Returns the integer code written to the status log.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::MarkedRollback => 1,
            Self::Prepared => 2,
            Self::Committed => 3,
            Self::RolledBack => 4,
            Self::Unknown => 5,
            Self::NoTransaction => 6,
            Self::Preparing => 7,
            Self::Committing => 8,
            Self::RollingBack => 9,
        }
    }

    /// Converts a status log code back to a status.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Active),
            1 => Some(Self::MarkedRollback),
            2 => Some(Self::Prepared),
            3 => Some(Self::Committed),
            4 => Some(Self::RolledBack),
            5 => Some(Self::Unknown),
            6 => Some(Self::NoTransaction),
            7 => Some(Self::Preparing),
            8 => Some(Self::Committing),
            9 => Some(Self::RollingBack),
            _ => None,
        }
    }

    /// Returns true if `set_rollback_only` latches the flag in this status.
    #[must_use]
    pub const fn allows_rollback_only(self) -> bool {
        matches!(
            self,
            Self::Active | Self::Preparing | Self::Prepared | Self::Committed | Self::Committing
        )
    }

    /// Returns true if `rollback` may start from this status.
    #[must_use]
    pub const fn can_roll_back(self) -> bool {
        !matches!(
            self,
            Self::NoTransaction
                | Self::Committed
                | Self::RolledBack
                | Self::RollingBack
                | Self::Unknown
        )
    }

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::MarkedRollback => "MARKED_ROLLBACK",
            Self::Prepared => "PREPARED",
            Self::Committed => "COMMITTED",
            Self::RolledBack => "ROLLEDBACK",
            Self::Unknown => "UNKNOWN",
            Self::NoTransaction => "NO_TRANSACTION",
            Self::Preparing => "PREPARING",
            Self::Committing => "COMMITTING",
            Self::RollingBack => "ROLLING_BACK",
        }
    }
}

impl fmt::Display for TxnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

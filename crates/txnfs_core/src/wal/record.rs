//! Status record serialization.

use crate::error::TxnResult;
use crate::transaction::TxnStatus;
use serde::{Deserialize, Serialize};

/// A single status log record, as stored on disk.
///
/// The status is kept as its raw integer code so that records with codes
/// this version does not know can still be parsed and then skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    /// Integer status code.
    pub txn_status: i64,
}

impl StatusRecord {
    /// Creates a record for `status`.
    #[must_use]
    pub fn new(status: TxnStatus) -> Self {
        Self {
            txn_status: i64::from(status.code()),
        }
    }

    /// Returns the decoded status, or `None` for an unrecognized code.
    #[must_use]
    pub fn status(&self) -> Option<TxnStatus> {
        TxnStatus::from_code(self.txn_status)
    }

    /// Encodes the record as one log line, including the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode_line(&self) -> TxnResult<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

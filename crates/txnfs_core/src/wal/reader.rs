//! Status log scanning.

use crate::transaction::TxnStatus;
use crate::wal::record::StatusRecord;
use tracing::warn;

/// Result of scanning a status log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogScan {
    /// Every readable status, in log order.
    pub statuses: Vec<TxnStatus>,
    /// Number of unreadable records that were skipped.
    pub skipped: usize,
}

impl LogScan {
    /// Returns the authoritative status: the last readable record.
    #[must_use]
    pub fn last(&self) -> Option<TxnStatus> {
        self.statuses.last().copied()
    }

    /// Returns the status recovery should act on.
    ///
    /// An empty or entirely unreadable log yields [`TxnStatus::Unknown`].
    #[must_use]
    pub fn recovered_status(&self) -> TxnStatus {
        self.last().unwrap_or(TxnStatus::Unknown)
    }
}

/// Scans raw status log bytes.
///
/// Never fails: anything unreadable is counted in [`LogScan::skipped`] and
/// otherwise ignored. Within a line, reading stops at the first unreadable
/// record.
#[must_use]
pub fn scan(bytes: &[u8]) -> LogScan {
    let text = String::from_utf8_lossy(bytes);
    let mut result = LogScan::default();

    for (line_no, line) in text.lines().enumerate() {
        let stream = serde_json::Deserializer::from_str(line).into_iter::<StatusRecord>();
        for record in stream {
            match record {
                Ok(record) => match record.status() {
                    Some(status) => result.statuses.push(status),
                    None => {
                        warn!(
                            line = line_no + 1,
                            code = record.txn_status,
                            "skipping status record with unknown code"
                        );
                        result.skipped += 1;
                    }
                },
                Err(err) => {
                    warn!(
                        line = line_no + 1,
                        error = %err,
                        "skipping unreadable status record"
                    );
                    result.skipped += 1;
                    break;
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_is_unknown() {
        let scan = scan(b"");
        assert_eq!(scan.last(), None);
        assert_eq!(scan.recovered_status(), TxnStatus::Unknown);
        assert_eq!(scan.skipped, 0);
    }

    #[test]
    fn last_record_wins() {
        let scan = scan(b"{\"txnStatus\":0}\n{\"txnStatus\":7}\n{\"txnStatus\":2}\n");
        assert_eq!(
            scan.statuses,
            vec![TxnStatus::Active, TxnStatus::Preparing, TxnStatus::Prepared]
        );
        assert_eq!(scan.recovered_status(), TxnStatus::Prepared);
    }

    #[test]
    fn torn_final_line_is_skipped() {
        let scan = scan(b"{\"txnStatus\":7}\n{\"txnStatus\":8}\n{\"txnSt");
        assert_eq!(scan.recovered_status(), TxnStatus::Committing);
        assert_eq!(scan.skipped, 1);
    }

    #[test]
    fn garbage_lines_are_skipped() {
        let scan = scan(b"not json\n{\"txnStatus\":9}\n\n{\"other\":1}\n");
        assert_eq!(scan.recovered_status(), TxnStatus::RollingBack);
        assert_eq!(scan.skipped, 2);
    }

    #[test]
    fn unknown_codes_are_skipped() {
        let scan = scan(b"{\"txnStatus\":3}\n{\"txnStatus\":77}\n");
        assert_eq!(scan.recovered_status(), TxnStatus::Committed);
        assert_eq!(scan.skipped, 1);
    }

    #[test]
    fn concatenated_records_on_one_line() {
        // Logs without separators between records
        let scan = scan(b"{\"txnStatus\":7}{\"txnStatus\":2}{\"txnStatus\":8}");
        assert_eq!(scan.statuses.len(), 3);
        assert_eq!(scan.recovered_status(), TxnStatus::Committing);
    }

    #[test]
    fn concatenated_records_with_torn_tail() {
        let scan = scan(b"{\"txnStatus\":7}{\"txnStatus\":9}{\"txn");
        assert_eq!(scan.recovered_status(), TxnStatus::RollingBack);
        assert_eq!(scan.skipped, 1);
    }

    #[test]
    fn invalid_utf8_is_skipped() {
        let mut bytes = b"{\"txnStatus\":4}\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        let scan = scan(&bytes);
        assert_eq!(scan.recovered_status(), TxnStatus::RolledBack);
        assert_eq!(scan.skipped, 1);
    }
}

//! Status log: the write-ahead log of a transactional file.
//!
//! Every status transition is recorded before the protocol moves on to the
//! next data operation. On the next `begin`, the log is scanned and the last
//! readable record decides what repair is needed.
//!
//! ## Record Format
//!
//! One newline-free JSON object per line:
//!
//! ```text
//! {"txnStatus":7}
//! {"txnStatus":2}
//! {"txnStatus":8}
//! ```
//!
//! ## Write Modes
//!
//! - **Reset** (truncate then write): used when the status becomes
//!   `NO_TRANSACTION`, `UNKNOWN`, or `ACTIVE` through `begin`
//! - **Append**: every other transition
//!
//! ## Recovery Policy
//!
//! - Lines that fail to parse are skipped (a torn final write after a crash)
//! - Records with an unrecognized status code are skipped
//! - Several records concatenated on one line are all read, so logs written
//!   without separators stay recoverable
//! - No readable record at all means `UNKNOWN`

mod reader;
mod record;
mod writer;

pub use reader::{scan, LogScan};
pub use record::StatusRecord;
pub use writer::StatusLog;

//! Single-file transactions.
//!
//! A [`TransactionalFile`] drives a small state machine over four artifacts:
//!
//! ```text
//! NO_TRANSACTION --begin--> ACTIVE
//! ACTIVE --commit--> PREPARING --> PREPARED --> COMMITTING --> COMMITTED --> ACTIVE
//! ACTIVE --rollback--> ROLLING_BACK --> ROLLEDBACK --> ACTIVE
//! ```
//!
//! Every transition is written to the status log before the next data
//! operation starts, so a crash at any point leaves a trail that recovery
//! (run by the next `begin`) can act on.

mod file;
mod recovery;
mod status;

pub use file::TransactionalFile;
pub use recovery::{RecoveryAction, RecoveryReport};
pub use status::TxnStatus;

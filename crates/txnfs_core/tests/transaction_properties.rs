//! Integration tests for the transaction protocol on the OS filesystem.

use proptest::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use txnfs_core::{RecoveryAction, TransactionalFile, TxnError, TxnStatus};

fn log_text(primary: &Path) -> String {
    let mut log = primary.as_os_str().to_owned();
    log.push(".txn.log");
    fs::read_to_string(log).unwrap()
}

#[test]
fn absent_primary_scenario() {
    let dir = tempdir().unwrap();
    let primary = dir.path().join("nested").join("deeper").join("data.bin");

    let mut file = TransactionalFile::new(&primary);
    file.begin().unwrap();
    assert!(primary.is_file());
    assert_eq!(fs::read(&primary).unwrap(), b"");

    file.write_file(&[1, 2, 3]).unwrap();
    file.commit().unwrap();

    assert_eq!(file.read_file().unwrap(), vec![1, 2, 3]);
    assert_eq!(file.status(), TxnStatus::Active);
}

#[test]
fn read_and_write_before_begin_are_invalid_state() {
    let dir = tempdir().unwrap();
    let mut file = TransactionalFile::new(dir.path().join("data.bin"));

    assert!(matches!(file.read_file(), Err(TxnError::InvalidState { .. })));
    assert!(file.write_file(b"x").unwrap_err().is_invalid_state());
    assert!(!dir.path().join("data.bin").exists());
}

#[test]
fn log_records_one_json_object_per_line() {
    let dir = tempdir().unwrap();
    let primary = dir.path().join("data.bin");

    let mut file = TransactionalFile::new(&primary);
    file.begin().unwrap();
    file.write_file(b"v1").unwrap();
    file.commit().unwrap();

    assert_eq!(
        log_text(&primary),
        "{\"txnStatus\":0}\n{\"txnStatus\":7}\n{\"txnStatus\":2}\n\
         {\"txnStatus\":8}\n{\"txnStatus\":3}\n{\"txnStatus\":0}\n"
    );
}

#[test]
fn restart_discards_uncommitted_write_and_cleans_up() {
    let dir = tempdir().unwrap();
    let primary = dir.path().join("data.bin");

    let mut file = TransactionalFile::new(&primary);
    file.begin().unwrap();
    file.write_file(b"durable").unwrap();
    file.commit().unwrap();
    file.write_file(b"lost").unwrap();
    drop(file);

    let mut restarted = TransactionalFile::new(&primary);
    restarted.begin().unwrap();

    assert_eq!(restarted.read_file().unwrap(), b"durable");
    assert_eq!(
        restarted.last_recovery().map(|r| r.action),
        Some(RecoveryAction::None)
    );
    assert!(!dir.path().join("data.bin.txn.rollback").exists());
    assert_eq!(fs::read(dir.path().join("data.bin.txn.dirty")).unwrap(), b"durable");
    assert_eq!(log_text(&primary), "{\"txnStatus\":0}\n");
}

#[test]
fn crash_after_primary_copy_is_redone_on_begin() {
    let dir = tempdir().unwrap();
    let primary = dir.path().join("data.bin");

    // Artifacts as left by a commit that replaced the primary but never
    // logged COMMITTED
    fs::write(&primary, b"new").unwrap();
    fs::write(dir.path().join("data.bin.txn.dirty"), b"new").unwrap();
    fs::write(dir.path().join("data.bin.txn.rollback"), b"old").unwrap();
    fs::write(
        dir.path().join("data.bin.txn.log"),
        "{\"txnStatus\":0}\n{\"txnStatus\":7}\n{\"txnStatus\":2}\n{\"txnStatus\":8}\n",
    )
    .unwrap();

    let mut file = TransactionalFile::new(&primary);
    file.begin().unwrap();

    assert_eq!(file.read_file().unwrap(), b"new");
    let report = file.last_recovery().unwrap();
    assert_eq!(report.recovered_status, TxnStatus::Committing);
    assert_eq!(report.action, RecoveryAction::RedoCommit { applied: true });
}

#[test]
fn crash_inside_rollback_is_redone_on_begin() {
    let dir = tempdir().unwrap();
    let primary = dir.path().join("data.bin");

    fs::write(&primary, b"committed").unwrap();
    fs::write(dir.path().join("data.bin.txn.rollback"), b"snapshot").unwrap();
    fs::write(
        dir.path().join("data.bin.txn.log"),
        "{\"txnStatus\":0}\n{\"txnStatus\":9}\n",
    )
    .unwrap();

    let mut file = TransactionalFile::new(&primary);
    file.begin().unwrap();

    assert_eq!(file.read_file().unwrap(), b"snapshot");
}

fn bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..256)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn commit_then_read_returns_written(data in bytes()) {
        let dir = tempdir().unwrap();
        let mut file = TransactionalFile::new(dir.path().join("data.bin"));

        file.begin().unwrap();
        file.write_file(&data).unwrap();
        file.commit().unwrap();

        prop_assert_eq!(file.read_file().unwrap(), data);
    }

    #[test]
    fn rollback_discards_write(existing in bytes(), discarded in bytes()) {
        let dir = tempdir().unwrap();
        let primary = dir.path().join("data.bin");
        fs::write(&primary, &existing).unwrap();
        let mut file = TransactionalFile::new(&primary);

        file.begin().unwrap();
        file.commit().unwrap();
        file.write_file(&discarded).unwrap();
        file.rollback().unwrap();

        prop_assert_eq!(file.read_file().unwrap(), existing);
    }

    #[test]
    fn rollback_reverts_to_content_before_last_commit(
        first in bytes(),
        second in bytes(),
    ) {
        let dir = tempdir().unwrap();
        let mut file = TransactionalFile::new(dir.path().join("data.bin"));

        file.begin().unwrap();
        file.write_file(&first).unwrap();
        file.commit().unwrap();
        file.write_file(&second).unwrap();
        file.commit().unwrap();
        file.rollback().unwrap();

        prop_assert_eq!(file.read_file().unwrap(), first);
    }

    #[test]
    fn commits_chain_without_begin(versions in prop::collection::vec(bytes(), 1..6)) {
        let dir = tempdir().unwrap();
        let mut file = TransactionalFile::new(dir.path().join("data.bin"));
        file.begin().unwrap();

        for version in &versions {
            file.write_file(version).unwrap();
            file.commit().unwrap();
            prop_assert_eq!(file.status(), TxnStatus::Active);
            prop_assert_eq!(&file.read_file().unwrap(), version);
        }
    }

    #[test]
    fn recovery_twice_converges(
        old in bytes(),
        new in bytes(),
        tail in prop::sample::select(vec![
            TxnStatus::Active,
            TxnStatus::Preparing,
            TxnStatus::Prepared,
            TxnStatus::Committing,
            TxnStatus::Committed,
            TxnStatus::RollingBack,
            TxnStatus::RolledBack,
        ]),
    ) {
        let dir = tempdir().unwrap();
        let primary = dir.path().join("data.bin");
        fs::write(&primary, &old).unwrap();
        fs::write(dir.path().join("data.bin.txn.dirty"), &new).unwrap();
        fs::write(dir.path().join("data.bin.txn.rollback"), &old).unwrap();
        fs::write(
            dir.path().join("data.bin.txn.log"),
            format!("{{\"txnStatus\":{}}}\n", tail.code()),
        )
        .unwrap();

        let mut first = TransactionalFile::new(&primary);
        first.begin().unwrap();
        let after_first = first.read_file().unwrap();
        drop(first);

        let mut second = TransactionalFile::new(&primary);
        second.begin().unwrap();

        prop_assert_eq!(second.read_file().unwrap(), after_first);
    }
}

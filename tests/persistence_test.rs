#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: seed the database and pay job 2
    let mut cmd1 = Command::new(cargo_bin!("contract-ledger"));
    cmd1.arg("--seed")
        .arg("tests/fixtures")
        .arg("--db-path")
        .arg(&db_path)
        .args(["pay", "--job", "2", "--profile", "1"]);

    let output1 = cmd1.output().expect("Failed to execute command");
    assert!(output1.status.success());

    // 2. Second run without seeding: the payment must have been kept
    let mut cmd2 = Command::new(cargo_bin!("contract-ledger"));
    cmd2.arg("--db-path")
        .arg(&db_path)
        .args(["pay", "--job", "2", "--profile", "1"]);

    let output2 = cmd2.output().expect("Failed to execute command");
    assert_eq!(output2.status.code(), Some(2));
    let stderr2 = String::from_utf8_lossy(&output2.stderr);
    assert!(stderr2.contains("Job already paid"));

    // 3. Balances reflect the single payment
    let mut cmd3 = Command::new(cargo_bin!("contract-ledger"));
    cmd3.arg("--db-path").arg(&db_path).arg("balances");

    let output3 = cmd3.output().expect("Failed to execute command");
    assert!(output3.status.success());
    let stdout3 = String::from_utf8_lossy(&output3.stdout);
    assert!(stdout3.contains("\"949\""));
    assert!(stdout3.contains("\"1415\""));
}

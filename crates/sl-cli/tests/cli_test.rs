use std::time::{Duration, SystemTime};

use assert_cmd::Command;
use predicates::prelude::*;

fn sesslock() -> Command {
    let mut cmd = Command::cargo_bin("sesslock").unwrap();
    cmd.env_remove("SESSLOCK_CONFIG")
        .env_remove("SESSLOCK_SAVE_PATH")
        .env_remove("SESSLOCK_NAMESPACE");
    cmd
}

#[test]
fn test_create_id_prints_hex_id() {
    let dir = tempfile::tempdir().unwrap();
    let output = sesslock()
        .args(["--save-path", dir.path().to_str().unwrap(), "create-id"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let id = String::from_utf8(output.stdout).unwrap();
    let id = id.trim();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
}

#[test]
fn test_check_reports_malformed_id() {
    sesslock()
        .args(["--save-path", "memory:", "check", "not-an-id"])
        .assert()
        .success()
        .stdout(predicate::str::contains("malformed"));
}

#[test]
fn test_check_reports_existing_entry() {
    let dir = tempfile::tempdir().unwrap();
    let id = "0123456789abcdef0123456789abcdef";
    std::fs::write(dir.path().join(format!("sess_shop_{id}")), b"x").unwrap();

    sesslock()
        .args(["--save-path", dir.path().to_str().unwrap(), "--namespace", "shop"])
        .args(["check", id])
        .assert()
        .success()
        .stdout(predicate::str::contains("in use"));
}

#[test]
fn test_gc_removes_expired_entries() {
    let dir = tempfile::tempdir().unwrap();
    let old = dir.path().join("sess_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    let fresh = dir.path().join("sess_bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
    std::fs::write(&old, b"x").unwrap();
    std::fs::write(&fresh, b"x").unwrap();
    std::fs::File::options()
        .write(true)
        .open(&old)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(600))
        .unwrap();

    sesslock()
        .args(["--save-path", dir.path().to_str().unwrap(), "gc", "--ttl", "60"])
        .assert()
        .success()
        .stdout("1\n");
    assert!(!old.exists());
    assert!(fresh.exists());
}

#[test]
fn test_rejects_unknown_scheme() {
    sesslock()
        .args(["--save-path", "mysql://localhost/sessions", "create-id"])
        .assert()
        .failure();
}

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::tempdir;

#[test]
fn init_creates_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("focus-poll.toml");

    let mut cmd = cargo_bin_cmd!("focus-poll");
    cmd.arg("init")
        .arg("--path")
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("created config"));

    let content = fs::read_to_string(path).unwrap();
    assert!(content.contains("[polling]"));
    assert!(content.contains("[fetch]"));
}

#[test]
fn init_prevents_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("focus-poll.toml");
    fs::write(&path, "run_on_load = false\n").unwrap();

    let mut fail_cmd = cargo_bin_cmd!("focus-poll");
    fail_cmd
        .arg("init")
        .arg("--path")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("use --force to overwrite"));

    let mut ok_cmd = cargo_bin_cmd!("focus-poll");
    ok_cmd
        .arg("init")
        .arg("--path")
        .arg(&path)
        .arg("--force")
        .assert()
        .success();

    let content = fs::read_to_string(path).unwrap();
    assert!(content.contains("concurrency_policy"));
}

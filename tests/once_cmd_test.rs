#![cfg(unix)]

use std::{fs, path::PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::{tempdir, TempDir};

fn write_config(command: &str, format: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("focus-poll.toml");
    fs::write(
        &path,
        format!("[fetch]\ncommand = {command:?}\nformat = {format:?}\n"),
    )
    .unwrap();
    (dir, path)
}

#[test]
fn once_prints_text_output() {
    let (_dir, path) = write_config("echo hello", "text");

    let mut cmd = cargo_bin_cmd!("focus-poll");
    cmd.arg("once")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("hello"));
}

#[test]
fn once_json_prints_snapshot() {
    let (_dir, path) = write_config(r#"printf '{"status":"ok"}'"#, "json");

    let mut cmd = cargo_bin_cmd!("focus-poll");
    cmd.arg("once")
        .arg("--config")
        .arg(&path)
        .arg("--json")
        .assert()
        .success()
        .stdout(contains(r#""data":{"status":"ok"}"#))
        .stdout(contains(r#""loading":false"#));
}

#[test]
fn failing_fetch_exits_with_code_two() {
    let (_dir, path) = write_config("echo boom >&2; exit 3", "text");

    let mut cmd = cargo_bin_cmd!("focus-poll");
    cmd.arg("once")
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .code(2)
        .stderr(contains("fetch failed"))
        .stderr(contains("boom"));
}

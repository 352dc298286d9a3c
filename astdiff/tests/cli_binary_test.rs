use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_binary_compares_directory() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(
        temp.path().join("one.rs"),
        "fn area(w: f64, h: f64) -> f64 {\n    w * h\n}\n",
    )?;
    fs::write(
        temp.path().join("two.rs"),
        "fn surface(w: f64, h: f64) -> f64 {\n    w * h\n}\n",
    )?;

    let mut cmd = Command::cargo_bin("astdiff-bin")?;
    cmd.arg(temp.path())
        .arg("--details")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pair Similarity"))
        .stdout(predicate::str::contains("Action: single-update"))
        .stdout(predicate::str::contains("\"area\""));

    Ok(())
}

#[test]
fn test_binary_rejects_missing_path() -> Result<()> {
    let temp = TempDir::new()?;
    let mut cmd = Command::cargo_bin("astdiff-bin")?;
    cmd.arg(temp.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}

#[test]
fn test_binary_logs_with_env_filter() -> Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("notes.txt"), "plain text\n")?;

    let mut cmd = Command::cargo_bin("astdiff-bin")?;
    cmd.arg(temp.path().join("notes.txt"))
        .arg("--json")
        .env("ASTDIFF_LOG", "warn")
        .assert()
        .success()
        .stderr(predicate::str::contains("no grammar"));
    Ok(())
}

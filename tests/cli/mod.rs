//! CLI surface tests that stop before any database connection is made.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn metamig(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("metamig").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() -> Result<()> {
    let dir = TempDir::new()?;
    metamig(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("rollback-to"))
        .stdout(predicate::str::contains("construct"))
        .stdout(predicate::str::contains("history"));
    Ok(())
}

#[test]
fn test_apply_reports_missing_document() -> Result<()> {
    let dir = TempDir::new()?;
    metamig(&dir)
        .args(["apply", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read migration file"));
    Ok(())
}

#[test]
fn test_apply_rejects_malformed_document() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("broken.json"), "{\"operations\": 3}")?;
    metamig(&dir)
        .args(["apply", "broken.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed migration document"));
    Ok(())
}

#[test]
fn test_construct_needs_desired_or_delete() -> Result<()> {
    let dir = TempDir::new()?;
    metamig(&dir).arg("construct").assert().failure();
    metamig(&dir)
        .args(["construct", "desired.json", "--delete", "post"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
    Ok(())
}

#[test]
fn test_invalid_config_file_is_reported() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("metamig.yaml"), "migration:\n  confirm_rollback: maybe\n")?;
    metamig(&dir)
        .args(["history"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
    Ok(())
}

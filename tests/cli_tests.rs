//! CLI integration tests using assert_cmd.
//!
//! These tests invoke the actual `pkgmig` binary against a temporary data
//! directory and an explicit config file.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[allow(deprecated)]
fn pkgmig_cmd() -> Command {
    Command::cargo_bin("pkgmig").expect("binary should exist")
}

/// Temp dir holding `config.json` (one environment) and a `data/` directory.
fn workspace() -> TempDir {
    let tmp = TempDir::new().expect("create temp dir");
    std::fs::write(
        tmp.path().join("config.json"),
        r#"{
            "environments": {
                "CRBP_DEV": "http://127.0.0.1:9/MicroStrategyLibrary/"
            },
            "service_account": {"username": "svc", "password_env": "PKGMIG_CLI_TEST_UNSET_PW"}
        }"#,
    )
    .expect("write config");
    tmp
}

fn cmd_in(tmp: &TempDir) -> Command {
    let mut cmd = pkgmig_cmd();
    cmd.arg("--config")
        .arg(tmp.path().join("config.json"))
        .arg("--data-dir")
        .arg(tmp.path().join("data"));
    cmd
}

#[test]
fn test_version_flag() {
    pkgmig_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn test_help_flag() {
    pkgmig_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Package Migrator"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("environments"))
        .stdout(predicate::str::contains("prune"));
}

#[test]
fn test_run_help_shows_options() {
    pkgmig_cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--environment"))
        .stdout(predicate::str::contains("--action"))
        .stdout(predicate::str::contains("--project"))
        .stdout(predicate::str::contains("--package"));
}

#[test]
fn test_no_subcommand_shows_help() {
    pkgmig_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("Package Migrator"));
}

#[test]
fn test_history_empty() {
    let tmp = workspace();
    cmd_in(&tmp)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No migrations yet"));
    assert!(tmp.path().join("data").join("builds").is_dir());
}

#[test]
fn test_history_zero_limit_rejected() {
    let tmp = workspace();
    cmd_in(&tmp)
        .args(["run", "-e", "CRBP_NOWHERE", "-a", "Refresh Schema"])
        .assert()
        .failure();

    cmd_in(&tmp)
        .args(["history", "--limit", "0"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("No migrations yet").not());
}

#[test]
fn test_show_unknown_run_fails() {
    let tmp = workspace();
    cmd_in(&tmp)
        .args(["show", "1599"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found: migration #1599"));
}

#[test]
fn test_environments_lists_configured() {
    let tmp = workspace();
    cmd_in(&tmp)
        .arg("environments")
        .assert()
        .success()
        .stdout(predicate::str::contains("CRBP_DEV"))
        .stdout(predicate::str::contains(
            "http://127.0.0.1:9/MicroStrategyLibrary/",
        ));
}

#[test]
fn test_missing_explicit_config_fails() {
    let tmp = TempDir::new().expect("create temp dir");
    pkgmig_cmd()
        .arg("--config")
        .arg(tmp.path().join("nope.json"))
        .arg("history")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_failed_run_is_recorded_and_shown() {
    let tmp = workspace();

    // Unknown environment: fails before any network call.
    cmd_in(&tmp)
        .args(["run", "-e", "CRBP_NOWHERE", "-a", "Refresh Schema"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("MIGRATION FAILED"))
        .stderr(predicate::str::contains("Migration #1599 failed"));

    // Password variable unset: configuration failure.
    cmd_in(&tmp)
        .env_remove("PKGMIG_CLI_TEST_UNSET_PW")
        .args(["run", "-e", "CRBP_DEV", "-a", "Refresh Schema"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Migration #1600 failed"))
        .stderr(predicate::str::contains("Configuration error"));

    cmd_in(&tmp)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("ERR #1600 inventory"))
        .stdout(predicate::str::contains("ERR #1599 inventory"));

    cmd_in(&tmp)
        .args(["show", "1599"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Migration #1599"))
        .stdout(predicate::str::contains("Status: FAILURE"))
        .stdout(predicate::str::contains("Environment: CRBP_NOWHERE"))
        .stdout(predicate::str::contains("Unknown environment 'CRBP_NOWHERE'"));
}

#[test]
fn test_history_json_output() {
    let tmp = workspace();
    cmd_in(&tmp)
        .args(["run", "-e", "CRBP_NOWHERE", "-a", "Refresh Schema"])
        .assert()
        .failure();

    let output = cmd_in(&tmp)
        .args(["history", "--json"])
        .output()
        .expect("run history");
    assert!(output.status.success());
    let records: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(records[0]["run_number"], 1599);
    assert_eq!(records[0]["status"], "FAILURE");
    assert!(records[0]["logs"].as_array().is_some());
}

#[test]
fn test_prune_keeps_newest() {
    let tmp = workspace();
    for _ in 0..3 {
        cmd_in(&tmp)
            .args(["run", "-e", "CRBP_NOWHERE", "-a", "Refresh Schema"])
            .assert()
            .failure();
    }

    cmd_in(&tmp)
        .args(["prune", "--keep", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 2"));

    cmd_in(&tmp)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("#1601"))
        .stdout(predicate::str::contains("#1599").not());
}

//! CLI integration tests.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn pegwatch() -> Command {
    let mut cmd = cargo_bin_cmd!("pegwatch");
    cmd.env_remove("TELEGRAM_BOT_TOKEN")
        .env_remove("ALERT_CHANNEL_ID")
        .env_remove("PREMIUM_CHANNEL_ID");
    cmd
}

fn config_file(contents: &str) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .prefix("pegwatch-cli-")
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    std::fs::write(file.path(), contents).expect("write temp config");
    file
}

const VALID: &str = r#"
[monitor]
interval_secs = 30

[[alerting.channels]]
id = "@depeg_alerts"
tier = "free"
"#;

#[test]
fn test_help() {
    pegwatch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pegwatch"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_version() {
    pegwatch()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pegwatch"));
}

#[test]
fn test_run_help_lists_once() {
    pegwatch()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--once"));
}

#[test]
fn test_check_valid_config() {
    let file = config_file(VALID);
    pegwatch()
        .args(["--color", "never", "check", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"))
        .stdout(predicate::str::contains("30s"));
}

#[test]
fn test_check_rejects_invalid_config() {
    let file = config_file("[monitor]\ninterval_secs = 0\n");
    pegwatch()
        .args(["--color", "never", "check", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval_secs"));
}

#[test]
fn test_check_missing_file_fails() {
    pegwatch()
        .args(["check", "--config", "/nonexistent/pegwatch.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load"));
}

#[test]
fn test_check_fails_when_telegram_lacks_token() {
    let file = config_file("[telegram]\nenabled = true\n");
    pegwatch()
        .args(["--color", "never", "check", "--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("TELEGRAM_BOT_TOKEN"));
}

#[test]
fn test_check_json_output() {
    let file = config_file(VALID);
    let output = pegwatch()
        .args(["--json", "check", "--config"])
        .arg(file.path())
        .output()
        .expect("run pegwatch");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert!(!lines.is_empty());
    assert!(lines.iter().all(|line| line.get("type").is_some()));
}

#[test]
fn test_quiet_suppresses_regular_output() {
    let file = config_file(VALID);
    pegwatch()
        .args(["--quiet", "check", "--config"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

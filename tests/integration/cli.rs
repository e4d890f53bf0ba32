//! Exit status and diagnostics of the `instllr` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

fn instllr(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("instllr").unwrap();
    cmd.env("INSTLLR_CONFIG_PATH", config_dir.path().join("config.toml"))
        .env_remove("GH_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    instllr(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("uninstall"));
}

#[test]
fn test_bad_locator_fails() {
    let temp = TempDir::new().unwrap();
    instllr(&temp)
        .args(["install", "not-a-locator"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("<owner>/<repo>"));
}

#[test]
fn test_host_without_port_fails() {
    let temp = TempDir::new().unwrap();
    instllr(&temp)
        .args(["install", "acme/svc", "--host", "svc.example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--port"));
}

#[test]
#[serial]
fn test_invalid_config_is_one_error_line() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("config.toml"), "unknown_key = true\n").unwrap();

    let output = instllr(&temp).args(["install", "acme/svc"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 1, "stderr: {stderr}");
    assert!(lines[0].contains("error"));
}

#[test]
#[serial]
fn test_unreachable_github_fails() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let config = format!(
        "github_api_url = \"http://127.0.0.1:9\"\n\
         services_root = \"{0}/home\"\n\
         ledger_dir = \"{0}/ledger\"\n\
         systemd_dir = \"{0}/systemd\"\n\
         nginx_sites_dir = \"{0}/nginx\"\n\
         nginx_log_root = \"{0}/log\"\n\
         certs_root = \"{0}/certs\"\n",
        root.display()
    );
    std::fs::write(root.join("config.toml"), config).unwrap();

    instllr(&temp)
        .args(["install", "acme/svc:1.0.0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("FetchRelease failed"));
    assert!(!root.join("home").exists());
}

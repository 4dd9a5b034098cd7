//! Integration tests for the `adloop` CLI binary.
//!
//! Argument parsing, config handling and exit codes run without a backend;
//! the one-shot commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `adloop` binary with env isolation.
///
/// Clears all `ADLOOP_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn adloop_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("adloop");
    cmd.env("HOME", "/tmp/adloop-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/adloop-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/adloop-cli-test-nonexistent")
        .env_remove("ADLOOP_API_BASE_URL")
        .env_remove("ADLOOP_DEVICE_ID")
        .env_remove("ADLOOP_CONFIG")
        .env_remove("ADLOOP_TIMEOUT_SECS")
        .env_remove("ADLOOP_HEARTBEAT_INTERVAL_MS")
        .env_remove("ADLOOP_BRANCH_CHECK_INTERVAL_MS")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run a prepared command off the async runtime.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = adloop_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    adloop_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("AdLoop")
            .and(predicate::str::contains("run"))
            .and(predicate::str::contains("branches"))
            .and(predicate::str::contains("heartbeat")),
    );
}

#[test]
fn test_version_flag() {
    adloop_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    let output = adloop_cmd().arg("frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_branches_without_api_url_exits_with_config_code() {
    let output = adloop_cmd().arg("branches").output().unwrap();
    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(
        text.contains("No backend URL configured"),
        "Expected missing URL error:\n{text}"
    );
}

#[test]
fn test_invalid_api_url_exits_with_config_code() {
    let output = adloop_cmd()
        .args(["--api-url", "ftp://signage.local", "status"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_config_path_honors_flag() {
    adloop_cmd()
        .args(["--config", "/tmp/adloop-elsewhere/config.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/adloop-elsewhere/config.toml"));
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("config.toml");
    let file_arg = file.to_str().unwrap();

    adloop_cmd()
        .args([
            "--config",
            file_arg,
            "--api-url",
            "http://signage.local:8000/",
            "config",
            "init",
        ])
        .assert()
        .success();
    assert!(file.exists());

    adloop_cmd()
        .args(["--config", file_arg, "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "api_base_url = \"http://signage.local:8000/\"",
        ));

    let output = adloop_cmd()
        .args(["--config", file_arg, "config", "init"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("already exists"));
}

#[test]
fn test_device_id_from_flag() {
    adloop_cmd()
        .args(["--device-id", "lobby-tv", "device-id"])
        .assert()
        .success()
        .stdout("lobby-tv\n");
}

// ── Backend commands ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_branches_lists_active_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/branches/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Lobby", "description": "Front desk", "video_count": 3, "is_active": true},
            {"id": 2, "name": "Archive", "video_count": 9, "is_active": false}
        ])))
        .mount(&server)
        .await;

    let mut cmd = adloop_cmd();
    cmd.args(["--api-url", server.uri().as_str(), "-o", "plain", "branches"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "1\n");

    let mut cmd = adloop_cmd();
    cmd.args(["--api-url", server.uri().as_str(), "-o", "table", "branches", "--all"]);
    let output = run(cmd).await;
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Lobby") && stdout.contains("Archive"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_assign_puts_branch_for_device() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/lobby-tv/"))
        .and(body_json(json!({"branch_id": "7"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = adloop_cmd();
    cmd.args(["--api-url", server.uri().as_str(), "--device-id", "lobby-tv", "assign", "7"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_assign_unknown_device_exits_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/devices/ghost/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut cmd = adloop_cmd();
    cmd.args(["--api-url", server.uri().as_str(), "--device-id", "ghost", "assign", "7"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json_reports_assignment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/branch"))
        .and(query_param("device_id", "lobby-tv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "branch_id": 5,
            "branch_updated_at": "2024-03-01T10:00:00Z",
            "videos": [{"id": 11, "file_url": "/media/a.mp4", "updated_at": "t1"}],
            "is_paused": false
        })))
        .mount(&server)
        .await;

    let mut cmd = adloop_cmd();
    cmd.args(["--api-url", server.uri().as_str(), "--device-id", "lobby-tv", "-o", "json", "status"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["device_id"], "lobby-tv");
    assert_eq!(view["identity_source"], "configured");
    assert_eq!(view["branch"]["branch_id"], "5");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_heartbeat_posts_zero_uptime() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/heartbeat"))
        .and(body_json(json!({
            "device_id": "lobby-tv",
            "current_video_id": "",
            "uptime": 0
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = adloop_cmd();
    cmd.args(["--api-url", server.uri().as_str(), "--device-id", "lobby-tv", "heartbeat"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_backend_exits_with_connection_code() {
    let mut cmd = adloop_cmd();
    cmd.args([
        "--api-url",
        "http://127.0.0.1:9",
        "--device-id",
        "lobby-tv",
        "--timeout",
        "2",
        "heartbeat",
    ]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}

//! Binary tests: exit codes and `--validate`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENT: &str = r#"{
    "client": {"name": "web-01", "address": "10.0.0.5", "subscriptions": ["web"]},
    "check": {"name": "http", "status": 2, "output": "CRITICAL"}
}"#;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn handler_command(config: &Path, extra: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_handler-slack"));
    cmd.arg("-c")
        .arg(config)
        .args(extra)
        .env_remove("LOG_FORMAT")
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

fn run_with_stdin(mut cmd: Command, stdin: &str) -> Output {
    let mut child = cmd.spawn().unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn write_settings(dir: &tempfile::TempDir, yaml: &str) -> PathBuf {
    let path = dir.path().join("slack.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

#[test]
fn missing_settings_file_exits_3() {
    let output = run_with_stdin(
        handler_command(Path::new("/nonexistent/slack.json"), &[]),
        EVENT,
    );
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn missing_section_exits_3() {
    let output = run_with_stdin(
        handler_command(&fixture_path("settings_single.json"), &["-j", "hipchat"]),
        EVENT,
    );
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("hipchat"), "stderr: {}", stderr);
}

#[test]
fn invalid_settings_exit_3() {
    let output = run_with_stdin(
        handler_command(&fixture_path("settings_missing_webhook.yaml"), &[]),
        EVENT,
    );
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn invalid_event_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_settings(
        &dir,
        "slack:\n  webhook_url: http://127.0.0.1:1/hook\n  channel: \"#ops\"\n",
    );
    let output = run_with_stdin(handler_command(&config, &[]), "{not json");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn validate_prints_summary_and_exits_0() {
    let output = run_with_stdin(
        handler_command(&fixture_path("settings_single.json"), &["--validate"]),
        "",
    );
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration is valid"), "stdout: {}", stdout);
    assert!(stdout.contains("https://hooks.slack.com/…"));
    assert!(stdout.contains("#monitoring"));
    assert!(!stdout.contains("XXXX"));
    assert!(!stdout.contains("hunter2"));
}

#[test]
fn validate_reports_broken_template() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_settings(
        &dir,
        &format!(
            "slack:\n  webhook_url: https://hooks.slack.com/services/T0/B0/x\n  template: {}\n",
            fixture_path("templates/broken.j2").display()
        ),
    );
    let output = run_with_stdin(handler_command(&config, &["--validate"]), "");
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn event_can_be_read_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_settings(&dir, "slack:\n  webhook_url: http://127.0.0.1:1/hook\n");
    let event = dir.path().join("event.json");
    std::fs::write(&event, EVENT).unwrap();

    // No channel resolves, so nothing is sent and the run succeeds.
    let mut cmd = handler_command(&config, &["-e"]);
    cmd.arg(&event).stdin(Stdio::null());
    let output = cmd.output().unwrap();
    assert_eq!(output.status.code(), Some(0));
}

#[tokio::test(flavor = "multi_thread")]
async fn successful_delivery_exits_0() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_settings(
        &dir,
        &format!(
            "slack:\n  webhook_url: {}/hook\n  channel: \"#ops\"\n  webhook_retries: 1\n",
            server.uri()
        ),
    );

    let output = run_with_stdin(handler_command(&config, &[]), EVENT);
    assert_eq!(output.status.code(), Some(0));
}

#[tokio::test(flavor = "multi_thread")]
async fn exhausted_delivery_exits_1() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = write_settings(
        &dir,
        &format!(
            "slack:\n  webhook_url: {}/hook\n  channel: \"#ops\"\n  webhook_retries: 2\n  webhook_retry_sleep: 10ms\n",
            server.uri()
        ),
    );

    let output = run_with_stdin(
        handler_command(&config, &["--log-format", "json"]),
        EVENT,
    );
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("#ops"), "stderr: {}", stderr);
    assert!(!stderr.contains("/hook"), "webhook URL leaked: {}", stderr);
}

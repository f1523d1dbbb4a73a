//! CLI integration tests
//!
//! These tests run the `unilog` binary with a controlled environment.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn unilog(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_unilog"));
    cmd.current_dir(temp_dir.path())
        .env_clear()
        .env("PATH", std::env::var("PATH").unwrap_or_default());
    cmd
}

#[test]
fn test_cli_redact_stdin() {
    let temp_dir = TempDir::new().unwrap();
    let mut child = unilog(&temp_dir)
        .arg("redact")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"password=SuperSecret123\ncontact alice@example.com\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "password=REDACTED\ncontact ***@example.com\n"
    );
}

#[test]
fn test_cli_check_config_rejects_bad_bool() {
    let temp_dir = TempDir::new().unwrap();
    let output = unilog(&temp_dir)
        .arg("check-config")
        .env("ENABLE_FILE_LOGGING", "maybe")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("ERR_INVALID_BOOL"), "stderr: {}", stderr);
}

#[test]
fn test_cli_check_config_reads_dotenv() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".env"), "LOG_LEVEL=WARNING\nENVIRONMENT=production\n").unwrap();

    let output = unilog(&temp_dir).arg("check-config").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("level: WARNING"));
    assert!(stdout.contains("(production: true)"));
}

#[test]
fn test_cli_emit_writes_redacted_json_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let output = unilog(&temp_dir)
        .args([
            "emit",
            "--level",
            "error",
            "--message",
            "upstream rejected token=abc123",
            "--field",
            "password=hunter2",
            "--field",
            "room=r1",
            "--request-id",
            "req-cli-1",
        ])
        .env("ENABLE_FILE_LOGGING", "true")
        .env("LOG_FILE_PATH", "logs/app.log")
        .env("LOG_SOURCE", "cli-test")
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let content = fs::read_to_string(temp_dir.path().join("logs/app.log")).unwrap();
    let record: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(record["level"], "ERROR");
    assert_eq!(record["message"], "upstream rejected token=REDACTED");
    assert_eq!(record["source"], "cli-test");
    assert_eq!(record["request_id"], "req-cli-1");
    assert_eq!(record["function"], "execute");
    assert_eq!(record["context"]["password"], "REDACTED");
    assert_eq!(record["context"]["room"], "r1");
}

//! Runs the `trellis` binary end to end.
//!
//! Resolved JSON goes to stdout; logs go to stderr or the configured file.

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn trellis(home: &Path, workspace: &Path, args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_trellis"));
    command
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env_remove("TRELLIS_ENV")
        .env_remove("TRELLIS_LOG")
        .env_remove("TRELLIS_LOG_FORMAT")
        .env_remove("TRELLIS_LOG_OUTPUT")
        .env_remove("TRELLIS_LOG_MODULES")
        .arg("--workspace")
        .arg(workspace)
        .args(args);
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().unwrap()
}

#[test]
fn test_stdout_carries_only_json() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(&workspace).unwrap();

    let output = trellis(
        temp_dir.path(),
        &workspace,
        &["--verbose", "parse", "{gen}/timeline/months?startDate=2020-01"],
        &[],
    );
    assert!(
        output.status.success(),
        "trellis parse should succeed: stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );

    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["module"], json!("gen"));
    assert_eq!(parsed["target"], json!("months"));
    assert_eq!(parsed["params"], json!({"startDate": "2020-01"}));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Trellis CLI starting"));
}

#[test]
fn test_file_logging_from_workspace_config() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    let log_file = temp_dir.path().join("logs").join("trellis.log");
    fs::create_dir_all(workspace.join("config")).unwrap();
    fs::write(
        workspace.join("config/config.toml"),
        format!(
            "[logging]\noutput = \"file\"\nfile = {:?}\n",
            log_file.to_string_lossy()
        ),
    )
    .unwrap();

    let output = trellis(temp_dir.path(), &workspace, &["config"], &[]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("[logging]"));
    assert!(output.stderr.is_empty());

    let logged = fs::read_to_string(&log_file).unwrap();
    assert!(logged.contains("Command completed successfully"));
}

#[test]
fn test_missing_page_exits_with_error() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");
    fs::create_dir_all(workspace.join("context/pages")).unwrap();
    fs::write(workspace.join("context/global.json"), "{}").unwrap();

    let output = trellis(
        temp_dir.path(),
        &workspace,
        &["page", "home"],
        &[("TRELLIS_LOG", "off")],
    );
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

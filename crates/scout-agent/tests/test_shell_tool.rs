//! Shell tool tests

mod common;

use scout_agent::tools::{ExecTool, Tool, ToolRegistry};
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_exec_captures_stdout_and_exit_code() {
    let dir = TempDir::new().unwrap();
    let tool = ExecTool::with_workspace(dir.path().to_path_buf());

    let output = tool
        .execute(json!({ "command": "echo hello" }))
        .await
        .unwrap();

    assert!(output.success);
    assert_eq!(output.result["stdout"].as_str().unwrap().trim(), "hello");
    assert_eq!(output.result["exit_code"], 0);
}

#[tokio::test]
async fn test_exec_runs_in_workspace() {
    let dir = TempDir::new().unwrap();
    let tool = ExecTool::with_workspace(dir.path().to_path_buf());

    let output = tool.execute(json!({ "command": "pwd" })).await.unwrap();
    let reported = output.result["stdout"].as_str().unwrap().trim();
    // canonicalize both sides: macOS tempdirs live behind /private symlinks
    assert_eq!(
        std::fs::canonicalize(reported).unwrap(),
        std::fs::canonicalize(dir.path()).unwrap()
    );
}

#[tokio::test]
async fn test_exec_nonzero_exit_is_failure_envelope() {
    let dir = TempDir::new().unwrap();
    let tool = ExecTool::with_workspace(dir.path().to_path_buf());

    let output = tool
        .execute(json!({ "command": "echo oops >&2; exit 3" }))
        .await
        .unwrap();

    assert!(!output.success);
    let error = output.error.unwrap();
    assert!(error.contains("code 3"));
    assert!(error.contains("oops"));
}

#[tokio::test]
async fn test_exec_timeout() {
    let dir = TempDir::new().unwrap();
    let tool = ExecTool::with_workspace(dir.path().to_path_buf());

    let output = tool
        .execute(json!({ "command": "sleep 5", "timeout": 1 }))
        .await
        .unwrap();

    assert!(!output.success);
    assert!(output.error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_exec_empty_command_fails_validation() {
    let dir = TempDir::new().unwrap();
    let mut registry = ToolRegistry::new();
    registry.register(ExecTool::with_workspace(dir.path().to_path_buf()));

    let output = registry.execute("exec", json!({ "command": "  " })).await;
    assert!(!output.success);
    assert!(output.error.unwrap().contains("invalid parameters"));
}

#[tokio::test]
async fn test_exec_working_dir_must_stay_in_workspace() {
    let dir = TempDir::new().unwrap();
    let tool = ExecTool::with_workspace(dir.path().to_path_buf());

    let output = tool
        .execute(json!({ "command": "pwd", "working_dir": "../.." }))
        .await
        .unwrap();

    assert!(!output.success);
    assert!(output.error.unwrap().contains("outside workspace"));
}

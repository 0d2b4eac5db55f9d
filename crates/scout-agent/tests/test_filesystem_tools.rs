//! Filesystem tool tests

mod common;

use scout_agent::tools::{register_default_tools, ToolRegistry};
use serde_json::json;
use tempfile::TempDir;

fn registry_for(dir: &TempDir) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_default_tools(&mut registry, dir.path());
    registry
}

#[tokio::test]
async fn test_write_then_read() {
    let dir = TempDir::new().unwrap();
    let registry = registry_for(&dir);

    let output = registry
        .execute(
            "write_file",
            json!({ "path": "notes/hello.txt", "content": "line one\nline two" }),
        )
        .await;
    assert!(output.success, "{:?}", output.error);

    let output = registry
        .execute("read_file", json!({ "path": "notes/hello.txt" }))
        .await;
    assert!(output.success);
    assert_eq!(output.result["content"], "line one\nline two");
    assert_eq!(output.result["lines"], 2);
}

#[tokio::test]
async fn test_read_missing_file_is_failure_envelope() {
    let dir = TempDir::new().unwrap();
    let registry = registry_for(&dir);

    let output = registry
        .execute("read_file", json!({ "path": "absent.txt" }))
        .await;
    assert!(!output.success);
    assert!(output.error.unwrap().contains("no such file"));
}

#[tokio::test]
async fn test_edit_unique_replacement() {
    let dir = TempDir::new().unwrap();
    let registry = registry_for(&dir);

    tokio::fs::write(dir.path().join("code.rs"), "fn old() {}\nfn keep() {}")
        .await
        .unwrap();

    let output = registry
        .execute(
            "edit_file",
            json!({ "path": "code.rs", "old_text": "fn old()", "new_text": "fn new()" }),
        )
        .await;
    assert!(output.success);

    let content = tokio::fs::read_to_string(dir.path().join("code.rs"))
        .await
        .unwrap();
    assert!(content.contains("fn new()"));
    assert!(content.contains("fn keep()"));
}

#[tokio::test]
async fn test_edit_rejects_ambiguous_match() {
    let dir = TempDir::new().unwrap();
    let registry = registry_for(&dir);

    tokio::fs::write(dir.path().join("dup.txt"), "same\nsame")
        .await
        .unwrap();

    let output = registry
        .execute(
            "edit_file",
            json!({ "path": "dup.txt", "old_text": "same", "new_text": "different" }),
        )
        .await;
    assert!(!output.success);
    assert!(output.error.unwrap().contains("must be unique"));
}

#[tokio::test]
async fn test_edit_rejects_missing_target() {
    let dir = TempDir::new().unwrap();
    let registry = registry_for(&dir);

    tokio::fs::write(dir.path().join("a.txt"), "content")
        .await
        .unwrap();

    let output = registry
        .execute(
            "edit_file",
            json!({ "path": "a.txt", "old_text": "nowhere", "new_text": "x" }),
        )
        .await;
    assert!(!output.success);
    assert!(output.error.unwrap().contains("not found"));
}

#[tokio::test]
async fn test_list_dir_entries() {
    let dir = TempDir::new().unwrap();
    let registry = registry_for(&dir);

    tokio::fs::create_dir(dir.path().join("sub")).await.unwrap();
    tokio::fs::write(dir.path().join("a.txt"), "x").await.unwrap();

    let output = registry.execute("list_dir", json!({})).await;
    assert!(output.success);
    assert_eq!(output.result["count"], 2);

    let entries = output.result["entries"].as_array().unwrap();
    assert_eq!(entries[0]["name"], "a.txt");
    assert_eq!(entries[0]["kind"], "file");
    assert_eq!(entries[1]["name"], "sub");
    assert_eq!(entries[1]["kind"], "dir");
}

#[tokio::test]
async fn test_path_escape_is_rejected() {
    let dir = TempDir::new().unwrap();
    let registry = registry_for(&dir);

    for args in [
        json!({ "path": "../outside.txt" }),
        json!({ "path": "/etc/passwd" }),
        json!({ "path": "a/../../escape.txt" }),
    ] {
        let output = registry.execute("read_file", args).await;
        assert!(!output.success);
        assert!(output.error.unwrap().contains("outside workspace"));
    }
}

#[tokio::test]
async fn test_missing_required_parameter_fails_validation() {
    let dir = TempDir::new().unwrap();
    let registry = registry_for(&dir);

    let output = registry.execute("read_file", json!({})).await;
    assert!(!output.success);
    assert!(output.error.unwrap().contains("invalid parameters"));
}

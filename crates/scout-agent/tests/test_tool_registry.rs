//! Tool registry integration tests

mod common;

use common::{AlwaysFailTool, NoopTool};
use scout_agent::tools::{register_default_tools, ToolRegistry};
use serde_json::json;
use std::path::Path;

#[test]
fn test_default_toolset_registration() {
    let mut registry = ToolRegistry::new();
    register_default_tools(&mut registry, Path::new("/tmp/ws"));

    for name in [
        "read_file",
        "write_file",
        "edit_file",
        "list_dir",
        "find_files",
        "search_files",
        "exec",
    ] {
        assert!(registry.has(name), "missing builtin tool {}", name);
    }
    assert_eq!(registry.names().len(), 7);
}

#[test]
fn test_list_is_sorted_and_described() {
    let mut registry = ToolRegistry::new();
    register_default_tools(&mut registry, Path::new("/tmp/ws"));

    let infos = registry.list();
    let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert!(infos.iter().all(|i| !i.description.is_empty()));
}

#[test]
fn test_definitions_match_provider_schema() {
    let mut registry = ToolRegistry::new();
    registry.register(NoopTool);

    let defs = registry.definitions();
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].tool_type, "function");
    assert_eq!(defs[0].function.name, "noop");
    assert_eq!(defs[0].function.parameters["type"], "object");
}

#[tokio::test]
async fn test_execute_unknown_tool_runs_no_tool_code() {
    let mut registry = ToolRegistry::new();
    registry.register(AlwaysFailTool);

    let output = registry.execute("definitely_absent", json!({})).await;
    assert!(!output.success);
    assert!(output.error.unwrap().contains("tool not found"));
}

#[tokio::test]
async fn test_execute_success_envelope() {
    let mut registry = ToolRegistry::new();
    registry.register(NoopTool);

    let output = registry.execute("noop", json!({ "x": 1 })).await;
    assert!(output.success);
    assert!(output.error.is_none());
    assert_eq!(output.result["echo"]["x"], 1);
}

#[tokio::test]
async fn test_execute_failure_envelope() {
    let mut registry = ToolRegistry::new();
    registry.register(AlwaysFailTool);

    let output = registry.execute("always_fail", json!({})).await;
    assert!(!output.success);
    assert_eq!(output.error.as_deref(), Some("deliberate failure"));
    assert!(output.result.is_null());
}

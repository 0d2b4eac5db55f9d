//! File name pattern matching tool

use async_recursion::async_recursion;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use super::path_utils::resolve_workspace_path;
use super::{Tool, ToolError, ToolOutput};

/// Maximum files to return
const MAX_RESULTS: usize = 1000;

/// Directories skipped during traversal
pub(crate) const SKIP_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "__pycache__",
    ".venv",
    "venv",
    "target",
    "dist",
    "build",
];

/// Find files by glob pattern, newest first.
pub struct FindFilesTool {
    workspace: PathBuf,
}

impl FindFilesTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct FindFilesArgs {
    pattern: String,
    path: Option<String>,
}

#[async_trait]
impl Tool for FindFilesTool {
    fn name(&self) -> &str {
        "find_files"
    }
    fn description(&self) -> &str {
        "Find files matching a glob pattern like \"**/*.rs\" or \"src/*.ts\". Returns paths sorted by modification time, newest first."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Glob pattern to match" },
                "path": { "type": "string", "description": "Directory to search, defaults to workspace root" }
            },
            "required": ["pattern"]
        })
    }
    fn validate(&self, args: &Value) -> bool {
        args.get("pattern").map(|v| v.is_string()).unwrap_or(false)
    }
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: FindFilesArgs = serde_json::from_value(args)?;
        let base = match resolve_workspace_path(
            args.path.as_deref().unwrap_or("."),
            &self.workspace,
        ) {
            Ok(p) => p,
            Err(e) => return Ok(ToolOutput::error(e.to_string())),
        };

        if !base.is_dir() {
            return Ok(ToolOutput::error(format!(
                "directory not found: {}",
                base.display()
            )));
        }

        debug!("finding files under {:?} matching {}", base, args.pattern);

        let mut matches: Vec<(String, SystemTime)> = Vec::new();
        walk_and_match(&base, &base, &args.pattern, &mut matches).await;

        // newest first
        matches.sort_by(|a, b| b.1.cmp(&a.1));

        let total = matches.len();
        let truncated = total > MAX_RESULTS;
        let files: Vec<String> = matches
            .into_iter()
            .take(MAX_RESULTS)
            .map(|(p, _)| p)
            .collect();

        Ok(ToolOutput::success(json!({
            "files": files,
            "count": total,
            "truncated": truncated,
        })))
    }
}

/// Recursively walk `dir` and collect files whose root-relative path matches.
#[async_recursion]
pub(crate) async fn walk_and_match(
    root: &Path,
    dir: &Path,
    pattern: &str,
    results: &mut Vec<(String, SystemTime)>,
) {
    if results.len() >= MAX_RESULTS * 2 {
        return;
    }

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(_) => return,
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let file_name = match entry.file_name().into_string() {
            Ok(s) => s,
            Err(_) => continue,
        };

        if path.is_dir() {
            if file_name.starts_with('.') || SKIP_DIRS.contains(&file_name.as_str()) {
                continue;
            }
            walk_and_match(root, &path, pattern, results).await;
        } else {
            let relative = match path.strip_prefix(root) {
                Ok(r) => r.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/"),
                Err(_) => continue,
            };

            if glob_match::glob_match(pattern, &relative) {
                let mtime = entry
                    .metadata()
                    .await
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                results.push((relative, mtime));
            }
        }
    }
}

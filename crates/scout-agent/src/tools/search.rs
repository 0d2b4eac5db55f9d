//! File content search tool

use async_recursion::async_recursion;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::find::SKIP_DIRS;
use super::path_utils::resolve_workspace_path;
use super::{Tool, ToolError, ToolOutput};

/// Maximum matches to return
const MAX_MATCHES: usize = 200;
/// Skip files larger than this
const MAX_FILE_BYTES: u64 = 1_000_000;

/// Search file contents with a regular expression.
pub struct SearchFilesTool {
    workspace: PathBuf,
}

impl SearchFilesTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct SearchFilesArgs {
    pattern: String,
    path: Option<String>,
    /// Optional glob restricting which files are searched, e.g. "**/*.rs"
    glob: Option<String>,
}

#[async_trait]
impl Tool for SearchFilesTool {
    fn name(&self) -> &str {
        "search_files"
    }
    fn description(&self) -> &str {
        "Search file contents with a regular expression. Returns matching lines with file and line number. Use the glob argument to restrict which files are searched."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Regular expression to search for" },
                "path": { "type": "string", "description": "Directory to search, defaults to workspace root" },
                "glob": { "type": "string", "description": "Optional glob filter, e.g. \"**/*.rs\"" }
            },
            "required": ["pattern"]
        })
    }
    fn validate(&self, args: &Value) -> bool {
        args.get("pattern").map(|v| v.is_string()).unwrap_or(false)
    }
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: SearchFilesArgs = serde_json::from_value(args)?;

        let regex = match Regex::new(&args.pattern) {
            Ok(r) => r,
            Err(e) => return Ok(ToolOutput::error(format!("invalid pattern: {}", e))),
        };

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

        debug!("searching under {:?} for /{}/", base, args.pattern);

        let mut matches = Vec::new();
        search_dir(&base, &base, &regex, args.glob.as_deref(), &mut matches).await;

        let total = matches.len();
        let truncated = total > MAX_MATCHES;
        matches.truncate(MAX_MATCHES);

        Ok(ToolOutput::success(json!({
            "matches": matches,
            "count": total,
            "truncated": truncated,
        })))
    }
}

#[async_recursion]
async fn search_dir(
    root: &Path,
    dir: &Path,
    regex: &Regex,
    glob: Option<&str>,
    results: &mut Vec<Value>,
) {
    if results.len() > MAX_MATCHES {
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
            search_dir(root, &path, regex, glob, results).await;
            continue;
        }

        let relative = match path.strip_prefix(root) {
            Ok(r) => r.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/"),
            Err(_) => continue,
        };

        if let Some(glob_pat) = glob {
            if !glob_match::glob_match(glob_pat, &relative) {
                continue;
            }
        }

        if let Ok(meta) = entry.metadata().await {
            if meta.len() > MAX_FILE_BYTES {
                continue;
            }
        }

        // binary files fail the utf-8 read and are skipped
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(_) => continue,
        };

        for (line_no, line) in content.lines().enumerate() {
            if regex.is_match(line) {
                results.push(json!({
                    "file": relative,
                    "line": line_no + 1,
                    "text": line.trim_end(),
                }));
                if results.len() > MAX_MATCHES {
                    return;
                }
            }
        }
    }
}

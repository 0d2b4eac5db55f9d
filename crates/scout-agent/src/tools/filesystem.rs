//! File system tools

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::debug;

use super::path_utils::resolve_workspace_path;
use super::{Tool, ToolError, ToolOutput};

/// Read a file's contents.
pub struct ReadFileTool {
    workspace: PathBuf,
}

impl ReadFileTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct ReadFileArgs {
    path: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }
    fn description(&self) -> &str {
        "Read the contents of a file at the given path."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "path": { "type": "string", "description": "File path" } },
            "required": ["path"]
        })
    }
    fn validate(&self, args: &Value) -> bool {
        args.get("path").map(|v| v.is_string()).unwrap_or(false)
    }
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: ReadFileArgs = serde_json::from_value(args)?;
        let path = match resolve_workspace_path(&args.path, &self.workspace) {
            Ok(p) => p,
            Err(e) => return Ok(ToolOutput::error(e.to_string())),
        };

        debug!("reading {:?}", path);
        if !path.exists() {
            return Ok(ToolOutput::error(format!("no such file: {}", args.path)));
        }
        if !path.is_file() {
            return Ok(ToolOutput::error(format!("not a file: {}", args.path)));
        }
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let lines = content.lines().count();
                Ok(ToolOutput::success(json!({
                    "content": content,
                    "lines": lines,
                })))
            }
            Err(e) => Ok(ToolOutput::error(format!(
                "failed to read {}: {}",
                args.path, e
            ))),
        }
    }
}

/// Write a file, creating parent directories.
pub struct WriteFileTool {
    workspace: PathBuf,
}

impl WriteFileTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct WriteFileArgs {
    path: String,
    content: String,
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }
    fn description(&self) -> &str {
        "Write content to a file, creating parent directories as needed."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File path" },
                "content": { "type": "string", "description": "Content to write" }
            },
            "required": ["path", "content"]
        })
    }
    fn validate(&self, args: &Value) -> bool {
        args.get("path").map(|v| v.is_string()).unwrap_or(false)
            && args.get("content").map(|v| v.is_string()).unwrap_or(false)
    }
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: WriteFileArgs = serde_json::from_value(args)?;
        let path = match resolve_workspace_path(&args.path, &self.workspace) {
            Ok(p) => p,
            Err(e) => return Ok(ToolOutput::error(e.to_string())),
        };

        debug!("writing {:?}", path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        match tokio::fs::write(&path, &args.content).await {
            Ok(_) => Ok(ToolOutput::success(json!({
                "content": format!("{} bytes written to {}", args.content.len(), args.path),
                "bytes": args.content.len(),
            }))),
            Err(e) => Ok(ToolOutput::error(format!(
                "failed to write {}: {}",
                args.path, e
            ))),
        }
    }
}

/// Replace a unique text segment in a file.
pub struct EditFileTool {
    workspace: PathBuf,
}

impl EditFileTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct EditFileArgs {
    path: String,
    old_text: String,
    new_text: String,
}

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }
    fn description(&self) -> &str {
        "Replace old_text with new_text in a file. old_text must match exactly once."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File path" },
                "old_text": { "type": "string", "description": "Text to replace" },
                "new_text": { "type": "string", "description": "Replacement text" }
            },
            "required": ["path", "old_text", "new_text"]
        })
    }
    fn validate(&self, args: &Value) -> bool {
        ["path", "old_text", "new_text"]
            .iter()
            .all(|k| args.get(k).map(|v| v.is_string()).unwrap_or(false))
    }
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: EditFileArgs = serde_json::from_value(args)?;
        let path = match resolve_workspace_path(&args.path, &self.workspace) {
            Ok(p) => p,
            Err(e) => return Ok(ToolOutput::error(e.to_string())),
        };

        debug!("editing {:?}", path);
        if !path.exists() {
            return Ok(ToolOutput::error(format!("no such file: {}", args.path)));
        }
        let content = tokio::fs::read_to_string(&path).await?;
        let count = content.matches(&args.old_text).count();
        if count == 0 {
            return Ok(ToolOutput::error("old_text not found in file"));
        }
        if count > 1 {
            return Ok(ToolOutput::error(format!(
                "old_text matches {} times, must be unique",
                count
            )));
        }
        let new_content = content.replacen(&args.old_text, &args.new_text, 1);
        tokio::fs::write(&path, new_content).await?;
        Ok(ToolOutput::success(json!({
            "content": format!("edited {}", args.path),
        })))
    }
}

/// List a directory's entries.
pub struct ListDirTool {
    workspace: PathBuf,
}

impl ListDirTool {
    pub fn new(workspace: PathBuf) -> Self {
        Self { workspace }
    }
}

#[derive(Deserialize)]
struct ListDirArgs {
    #[serde(default = "default_dir")]
    path: String,
}

fn default_dir() -> String {
    ".".to_string()
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }
    fn description(&self) -> &str {
        "List the contents of a directory."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "path": { "type": "string", "description": "Directory path, defaults to workspace root" } }
        })
    }
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: ListDirArgs = serde_json::from_value(args)?;
        let path = match resolve_workspace_path(&args.path, &self.workspace) {
            Ok(p) => p,
            Err(e) => return Ok(ToolOutput::error(e.to_string())),
        };

        debug!("listing {:?}", path);
        if !path.exists() {
            return Ok(ToolOutput::error(format!("no such path: {}", args.path)));
        }
        if !path.is_dir() {
            return Ok(ToolOutput::error(format!("not a directory: {}", args.path)));
        }
        let mut entries = tokio::fs::read_dir(&path).await?;
        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            let kind = if entry.file_type().await?.is_dir() {
                "dir"
            } else {
                "file"
            };
            items.push(json!({ "name": name, "kind": kind }));
        }
        items.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
        let count = items.len();
        Ok(ToolOutput::success(json!({
            "entries": items,
            "count": count,
        })))
    }
}

//! Shell execution tool

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::path_utils::resolve_workspace_path;
use super::{Tool, ToolError, ToolOutput};

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MAX_OUTPUT_BYTES: usize = 10_000;

/// Run a shell command inside the workspace.
pub struct ExecTool {
    timeout_secs: u64,
    workspace: PathBuf,
}

impl ExecTool {
    pub fn new(timeout_secs: u64, workspace: PathBuf) -> Self {
        Self {
            timeout_secs,
            workspace,
        }
    }

    pub fn with_workspace(workspace: PathBuf) -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS, workspace)
    }
}

#[derive(Deserialize)]
struct ExecArgs {
    command: String,
    working_dir: Option<String>,
    /// Per-call timeout in seconds, overrides the tool default
    timeout: Option<u64>,
}

#[async_trait]
impl Tool for ExecTool {
    fn name(&self) -> &str {
        "exec"
    }
    fn description(&self) -> &str {
        "Execute a shell command in the workspace. Returns stdout, stderr and the exit code."
    }
    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "Shell command to run" },
                "working_dir": { "type": "string", "description": "Optional working directory" },
                "timeout": { "type": "number", "description": "Optional timeout in seconds" }
            },
            "required": ["command"]
        })
    }
    fn validate(&self, args: &Value) -> bool {
        args.get("command")
            .and_then(|v| v.as_str())
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: ExecArgs = serde_json::from_value(args)?;

        let working_dir = match args.working_dir.as_deref() {
            Some(dir) => match resolve_workspace_path(dir, &self.workspace) {
                Ok(p) => p,
                Err(e) => return Ok(ToolOutput::error(e.to_string())),
            },
            None => self.workspace.clone(),
        };

        let timeout_secs = args.timeout.unwrap_or(self.timeout_secs);

        debug!("executing: {}", args.command);
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&args.command)
            .current_dir(&working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match tokio::time::timeout(
            tokio::time::Duration::from_secs(timeout_secs),
            cmd.output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Ok(ToolOutput::error(format!("spawn failed: {}", e))),
            Err(_) => {
                return Ok(ToolOutput::error(format!(
                    "command timed out after {} seconds",
                    timeout_secs
                )))
            }
        };

        let stdout = truncate(String::from_utf8_lossy(&output.stdout).into_owned());
        let stderr = truncate(String::from_utf8_lossy(&output.stderr).into_owned());
        let exit_code = output.status.code().unwrap_or(-1);

        if output.status.success() {
            Ok(ToolOutput::success(json!({
                "stdout": stdout,
                "stderr": stderr,
                "exit_code": exit_code,
            })))
        } else {
            Ok(ToolOutput::error(format!(
                "command exited with code {}\nstdout:\n{}\nstderr:\n{}",
                exit_code, stdout, stderr
            )))
        }
    }
}

fn truncate(s: String) -> String {
    if s.len() > MAX_OUTPUT_BYTES {
        let mut cut = MAX_OUTPUT_BYTES;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}\n[output truncated, {} bytes omitted]", &s[..cut], s.len() - cut)
    } else {
        s
    }
}

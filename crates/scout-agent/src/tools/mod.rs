//! Tool contract and registry

pub mod filesystem;
pub mod find;
pub mod path_utils;
pub mod search;
pub mod shell;

pub use filesystem::{EditFileTool, ListDirTool, ReadFileTool, WriteFileTool};
pub use find::FindFilesTool;
pub use search::SearchFilesTool;
pub use shell::ExecTool;

use async_trait::async_trait;
use scout_provider::ToolSpec;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::AgentError;

/// Fault escaping a tool's own execution; caught at the registry boundary.
pub type ToolError = Box<dyn std::error::Error + Send + Sync>;

/// Uniform outcome envelope for every tool execution.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub result: Value,
    pub error: Option<String>,
    /// Auxiliary diagnostics, not part of the success contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ToolOutput {
    pub fn success(result: Value) -> Self {
        Self {
            success: true,
            result,
            error: None,
            metadata: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: Value::Null,
            error: Some(message.into()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Render the primary textual payload for feeding back as an observation.
    ///
    /// Preference order: failure message, plain string result, `content`
    /// field, `stdout` field, then a JSON rendering of the whole result.
    pub fn observation_text(&self) -> String {
        if !self.success {
            return format!(
                "Error: {}",
                self.error.as_deref().unwrap_or("tool execution failed")
            );
        }
        if let Some(s) = self.result.as_str() {
            return s.to_string();
        }
        if let Some(s) = self.result.get("content").and_then(|v| v.as_str()) {
            return s.to_string();
        }
        if let Some(s) = self.result.get("stdout").and_then(|v| v.as_str()) {
            return s.to_string();
        }
        serde_json::to_string(&self.result).unwrap_or_else(|_| "(unrenderable result)".to_string())
    }
}

/// Contract every tool satisfies.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// JSON schema for the parameters, advertised in the tool catalogue.
    fn parameters(&self) -> Value;

    /// Pure parameter check, no side effects. The default accepts everything.
    fn validate(&self, _args: &Value) -> bool {
        true
    }

    /// Run the tool. Expected failures (missing file, bad pattern) come back
    /// as `success=false` envelopes; `Err` is reserved for escaping faults.
    async fn execute(&self, args: Value) -> std::result::Result<ToolOutput, ToolError>;
}

/// Name and description pair for catalogue listings.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Name-keyed tool registry.
///
/// The only entry point the reasoning loop uses is [`ToolRegistry::execute`],
/// which never propagates a fault: every outcome is a `ToolOutput` envelope.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool; the last registration for a name wins.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), Box::new(tool)).is_some() {
            debug!("tool '{}' re-registered, previous entry replaced", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Stable enumeration of the catalogue, sorted by name.
    pub fn list(&self) -> Vec<ToolInfo> {
        let mut infos: Vec<ToolInfo> = self
            .tools
            .values()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Tool schemas for backends that accept a native catalogue.
    pub fn definitions(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self
            .tools
            .values()
            .map(|t| ToolSpec::new(t.name(), t.description(), t.parameters()))
            .collect();
        specs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        specs
    }

    /// Execute a tool by name, normalizing every outcome into the envelope.
    ///
    /// Unknown names and rejected parameters never reach tool code; escaping
    /// faults are caught here and converted to `success=false`.
    pub async fn execute(&self, name: &str, args: Value) -> ToolOutput {
        let Some(tool) = self.tools.get(name) else {
            warn!("tool '{}' not found", name);
            return ToolOutput::error(AgentError::ToolNotFound(name.to_string()).to_string());
        };

        if !tool.validate(&args) {
            warn!("tool '{}' rejected parameters", name);
            return ToolOutput::error(AgentError::InvalidParameters(name.to_string()).to_string());
        }

        info!(tool = name, "executing tool");
        match tool.execute(args).await {
            Ok(output) => {
                if output.success {
                    debug!(tool = name, "tool succeeded");
                } else {
                    warn!(
                        tool = name,
                        error = output.error.as_deref().unwrap_or(""),
                        "tool reported failure"
                    );
                }
                output
            }
            Err(e) => {
                debug!(tool = name, error = %e, "tool execution fault");
                warn!(tool = name, "tool execution fault");
                ToolOutput::error(e.to_string())
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register the built-in toolset rooted at `workspace`.
pub fn register_default_tools(registry: &mut ToolRegistry, workspace: &std::path::Path) {
    registry.register(ReadFileTool::new(workspace.to_path_buf()));
    registry.register(WriteFileTool::new(workspace.to_path_buf()));
    registry.register(EditFileTool::new(workspace.to_path_buf()));
    registry.register(ListDirTool::new(workspace.to_path_buf()));
    registry.register(FindFilesTool::new(workspace.to_path_buf()));
    registry.register(SearchFilesTool::new(workspace.to_path_buf()));
    registry.register(ExecTool::with_workspace(workspace.to_path_buf()));
}

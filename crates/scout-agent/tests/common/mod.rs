//! Shared test fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use scout_provider::{ChatParams, ChatResponse, Provider, ProviderError, Result};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use scout_agent::tools::{Tool, ToolError, ToolOutput};

/// Replays a fixed script of text responses, repeating the last one when the
/// script runs out. Records every request it receives.
pub struct ScriptedProvider {
    responses: Vec<String>,
    next: AtomicUsize,
    pub calls: Mutex<Vec<ChatParams>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: responses.into_iter().map(String::from).collect(),
            next: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All message bodies sent in the nth request.
    pub fn request_texts(&self, n: usize) -> Vec<String> {
        self.calls.lock().unwrap()[n]
            .messages
            .iter()
            .map(|m| m.text().to_string())
            .collect()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        self.calls.lock().unwrap().push(params);
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        let content = self
            .responses
            .get(i)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or_default();
        Ok(ChatResponse::text(content))
    }

    fn default_model(&self) -> String {
        "scripted".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

/// Always fails with the configured error kind.
pub struct FailingProvider {
    pub kind: &'static str,
}

#[async_trait]
impl Provider for FailingProvider {
    async fn chat(&self, _params: ChatParams) -> Result<ChatResponse> {
        match self.kind {
            "not_configured" => Err(ProviderError::NotConfigured),
            _ => Err(ProviderError::Api("backend unavailable".to_string())),
        }
    }

    fn default_model(&self) -> String {
        "failing".to_string()
    }

    fn is_configured(&self) -> bool {
        self.kind != "not_configured"
    }
}

/// Tool that succeeds and echoes its arguments back.
pub struct NoopTool;

#[async_trait]
impl Tool for NoopTool {
    fn name(&self) -> &str {
        "noop"
    }
    fn description(&self) -> &str {
        "Does nothing, successfully."
    }
    fn parameters(&self) -> Value {
        json!({ "type": "object" })
    }
    async fn execute(&self, args: Value) -> std::result::Result<ToolOutput, ToolError> {
        Ok(ToolOutput::success(json!({ "content": "ok", "echo": args })))
    }
}

/// Tool that always reports failure.
pub struct AlwaysFailTool;

#[async_trait]
impl Tool for AlwaysFailTool {
    fn name(&self) -> &str {
        "always_fail"
    }
    fn description(&self) -> &str {
        "Fails every time."
    }
    fn parameters(&self) -> Value {
        json!({ "type": "object" })
    }
    async fn execute(&self, _args: Value) -> std::result::Result<ToolOutput, ToolError> {
        Ok(ToolOutput::error("deliberate failure"))
    }
}

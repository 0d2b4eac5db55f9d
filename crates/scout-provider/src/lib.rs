//! Model backend interface
//!
//! Message types and the `Provider` trait the reasoning loop talks through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod openai;

pub use openai::OpenAiProvider;

/// Backend errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("no API key configured")]
    NotConfigured,

    #[error("unexpected response shape")]
    InvalidResponse,

    #[error("rate limited")]
    RateLimited,
}

impl ProviderError {
    /// True when the failure is a missing credential rather than a fault.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, ProviderError::NotConfigured)
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// One turn in a conversation.
///
/// `content` may be absent on assistant turns that only carry tool calls;
/// `tool_call_id` and `name` are set only on tool-role turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain("assistant", content)
    }

    /// A tool-role message correlating a result back to its invoking call.
    pub fn tool(
        call_id: impl Into<String>,
        name: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(result.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
            name: Some(name.into()),
        }
    }

    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Content as text, empty when absent.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// A tool invocation attached to an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallDef {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

impl ToolCallDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            call_type: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Value,
}

/// A tool invocation request extracted from a backend response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Tool schema advertised to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDef,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One backend completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub finish_reason: String,
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
            usage: Usage::default(),
        }
    }
}

/// Completion request parameters.
#[derive(Debug, Clone)]
pub struct ChatParams {
    pub model: String,
    pub messages: Vec<Message>,
    /// Optional tool catalogue; empty when the protocol is prompt-driven.
    pub tools: Vec<ToolSpec>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            tools: Vec::new(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// A model backend.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse>;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ========== Message Tests ==========

    #[test]
    fn test_message_constructors() {
        let msg = Message::system("be helpful");
        assert_eq!(msg.role, "system");
        assert_eq!(msg.content, Some("be helpful".to_string()));
        assert!(msg.tool_calls.is_none());

        let msg = Message::user("hello");
        assert_eq!(msg.role, "user");

        let msg = Message::assistant("hi");
        assert_eq!(msg.role, "assistant");
        assert!(msg.tool_call_id.is_none());
    }

    #[test]
    fn test_message_tool() {
        let msg = Message::tool("call_7", "read_file", "contents here");
        assert_eq!(msg.role, "tool");
        assert_eq!(msg.tool_call_id, Some("call_7".to_string()));
        assert_eq!(msg.name, Some("read_file".to_string()));
        assert_eq!(msg.text(), "contents here");
    }

    #[test]
    fn test_message_text_empty_when_no_content() {
        let msg = Message {
            role: "assistant".to_string(),
            content: None,
            tool_calls: None,
            tool_call_id: None,
            name: None,
        };
        assert_eq!(msg.text(), "");
    }

    #[test]
    fn test_message_serialization_skips_absent_fields() {
        let json_str = serde_json::to_string(&Message::user("hi")).unwrap();
        assert!(json_str.contains("\"role\":\"user\""));
        assert!(!json_str.contains("tool_call_id"));
        assert!(!json_str.contains("tool_calls"));
    }

    // ========== ChatResponse Tests ==========

    #[test]
    fn test_chat_response_text_builder() {
        let response = ChatResponse::text("done");
        assert_eq!(response.content, Some("done".to_string()));
        assert!(!response.has_tool_calls());
        assert_eq!(response.finish_reason, "stop");
        assert_eq!(response.usage.total_tokens, 0);
    }

    #[test]
    fn test_chat_response_has_tool_calls() {
        let response = ChatResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: "exec".to_string(),
                arguments: json!({"command": "ls"}),
            }],
            finish_reason: "tool_calls".to_string(),
            usage: Usage::default(),
        };
        assert!(response.has_tool_calls());
    }

    // ========== ToolSpec Tests ==========

    #[test]
    fn test_tool_spec_new() {
        let spec = ToolSpec::new("exec", "Run a command", json!({"type": "object"}));
        assert_eq!(spec.tool_type, "function");
        assert_eq!(spec.function.name, "exec");
        assert_eq!(spec.function.description, "Run a command");
    }

    #[test]
    fn test_tool_call_def_new() {
        let def = ToolCallDef::new("call_1", "read_file", json!({"path": "a.rs"}));
        assert_eq!(def.id, "call_1");
        assert_eq!(def.call_type, "function");
        assert_eq!(def.function.arguments["path"], "a.rs");
    }

    // ========== ChatParams Tests ==========

    #[test]
    fn test_chat_params_default() {
        let params = ChatParams::default();
        assert!(params.messages.is_empty());
        assert!(params.tools.is_empty());
        assert_eq!(params.max_tokens, 4096);
        assert_eq!(params.temperature, 0.7);
    }

    // ========== Error Tests ==========

    #[test]
    fn test_not_configured_is_distinguishable() {
        assert!(ProviderError::NotConfigured.is_not_configured());
        assert!(!ProviderError::RateLimited.is_not_configured());
        assert!(!ProviderError::Api("boom".to_string()).is_not_configured());
    }
}

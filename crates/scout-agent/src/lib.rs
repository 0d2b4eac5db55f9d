//! Agent core
//!
//! The reasoning loop and its supporting pieces: the action parser that turns
//! model output into executable steps, the tool registry that runs them, and
//! the mode selector that decides when the loop is worth the round-trips.

use thiserror::Error;

pub mod agent;
pub mod cache;
pub mod context;
pub mod parser;
pub mod reasoner;
pub mod selector;
pub mod tools;

pub use agent::{Agent, AgentOptions, AgentReply, Mode};
pub use cache::ResponseCache;
pub use context::ContextBuilder;
pub use parser::{parse_action, parse_response, render_action, ActionCall, ParsedResponse, ReasoningStep};
pub use reasoner::{LoopStatus, ReactOutcome, Reasoner, ReasonerConfig};
pub use selector::ModeSelector;
pub use tools::{Tool, ToolOutput, ToolRegistry};

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("invalid parameters for tool '{0}'")]
    InvalidParameters(String),

    #[error("tool execution failed: {0}")]
    ToolExecution(String),

    #[error("backend error: {0}")]
    Provider(#[from] scout_provider::ProviderError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;

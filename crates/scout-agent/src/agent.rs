//! Agent facade
//!
//! Routes each user message through the mode selector into either the
//! reasoning loop or the single-shot path, and keeps the graceful-degradation
//! guarantees: nothing here returns an error to the caller.

use scout_provider::{ChatParams, Message, Provider, ProviderError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::ResponseCache;
use crate::context::ContextBuilder;
use crate::reasoner::{LoopStatus, Reasoner, ReasonerConfig};
use crate::selector::{ModeSelector, DEFAULT_CACHE_CAPACITY};
use crate::tools::ToolRegistry;

const NOT_CONFIGURED_HELP: &str = "No API key is configured. Add one to ~/.scout/config.json \
under providers.openai.api_key (or providers.openrouter.api_key), then try again.";

/// Which path handled a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SingleShot,
    MultiStep,
    /// Multi-step was attempted but a backend fault forced the fallback.
    Fallback,
}

/// What the agent hands back for one message.
#[derive(Debug)]
pub struct AgentReply {
    pub text: String,
    pub mode: Mode,
    /// Rendered reasoning chain, empty for single-shot replies.
    pub chain: Vec<String>,
    pub steps_used: u32,
}

/// Construction-time tuning; all caches are instance-owned so independent
/// agents never share state.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_steps: u32,
    pub max_consecutive_errors: u32,
    pub selector_cache_capacity: usize,
    pub response_cache_ttl: Duration,
    pub response_cache_capacity: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_tokens: 4096,
            temperature: 0.7,
            max_steps: crate::reasoner::DEFAULT_MAX_STEPS,
            max_consecutive_errors: crate::reasoner::DEFAULT_MAX_CONSECUTIVE_ERRORS,
            selector_cache_capacity: DEFAULT_CACHE_CAPACITY,
            response_cache_ttl: Duration::from_secs(300),
            response_cache_capacity: 50,
        }
    }
}

pub struct Agent {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    selector: ModeSelector,
    context: ContextBuilder,
    reasoner: Reasoner,
    response_cache: ResponseCache,
    options: AgentOptions,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        workspace: impl AsRef<Path>,
        options: AgentOptions,
    ) -> Self {
        let reasoner = Reasoner::new(
            provider.clone(),
            tools.clone(),
            ReasonerConfig {
                model: options.model.clone(),
                max_tokens: options.max_tokens,
                temperature: options.temperature,
                max_steps: options.max_steps,
                max_consecutive_errors: options.max_consecutive_errors,
            },
        );

        Self {
            provider,
            tools: tools.clone(),
            selector: ModeSelector::new(options.selector_cache_capacity),
            context: ContextBuilder::new(workspace),
            reasoner,
            response_cache: ResponseCache::new(
                options.response_cache_ttl,
                options.response_cache_capacity,
            ),
            options,
        }
    }

    /// Handle one user message. Never fails: backend faults degrade to a
    /// readable message, tool faults are already observations.
    pub async fn process(&self, input: &str, history: Vec<Message>) -> AgentReply {
        if self.selector.needs_multi_step(input) {
            info!("mode selector chose multi-step");
            match self
                .reasoner
                .run(self.context.reasoning_messages(&self.tools, history.clone(), input))
                .await
            {
                Ok(outcome) => {
                    if outcome.status == LoopStatus::Aborted {
                        warn!("reasoning loop hit the step budget, returning forced summary");
                    }
                    return AgentReply {
                        text: outcome.answer,
                        mode: Mode::MultiStep,
                        chain: outcome.chain,
                        steps_used: outcome.steps_used,
                    };
                }
                Err(e) => {
                    warn!("reasoning loop aborted ({}), falling back to single-shot", e);
                    // The fallback flag is structural: this path never
                    // re-enters the selector, so it cannot loop back here.
                    return self.single_shot(input, history, true).await;
                }
            }
        }

        info!("mode selector chose single-shot");
        self.single_shot(input, history, false).await
    }

    async fn single_shot(&self, input: &str, history: Vec<Message>, fallback: bool) -> AgentReply {
        let mode = if fallback {
            Mode::Fallback
        } else {
            Mode::SingleShot
        };

        let messages = self.context.single_shot_messages(history, input);
        let key = ResponseCache::key_for(&messages);
        if let Some(cached) = self.response_cache.get(&key) {
            return AgentReply {
                text: cached,
                mode,
                chain: Vec::new(),
                steps_used: 0,
            };
        }

        let params = ChatParams {
            model: self.options.model.clone(),
            messages,
            tools: Vec::new(),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        let text = match self.provider.chat(params).await {
            Ok(response) => {
                let text = response.content.unwrap_or_else(|| "(empty response)".to_string());
                self.response_cache.put(key, text.clone());
                text
            }
            Err(ProviderError::NotConfigured) => NOT_CONFIGURED_HELP.to_string(),
            Err(e) => {
                warn!("single-shot request failed: {}", e);
                format!("I could not reach the model backend: {}", e)
            }
        };

        AgentReply {
            text,
            mode,
            chain: Vec::new(),
            steps_used: 0,
        }
    }
}

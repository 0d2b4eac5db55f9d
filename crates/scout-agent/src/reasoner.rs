//! Reasoning loop
//!
//! Repeated rounds of: send the conversation to the backend, parse the
//! response into steps, execute actions through the registry, feed
//! observations back, and decide whether to continue, recover or stop.

use scout_provider::{ChatParams, Message, Provider, ToolCallDef};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::parser::{parse_response, render_action};
use crate::tools::ToolRegistry;
use crate::Result;

/// Default model round-trip budget.
pub const DEFAULT_MAX_STEPS: u32 = 10;
/// Default consecutive tool failures before a recovery cycle.
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 3;

const CORRECTION_PROMPT: &str = "Your previous reply did not follow the required format. \
Respond using the protocol exactly: start with 'Thought:', optionally followed by \
'Action: tool_name(parameters)', and give your conclusion as 'Final Answer: ...'.";

const RECOVERY_PROMPT: &str = "The last tool calls failed repeatedly. Diagnose what went wrong, \
then either try a different approach or explain in a Final Answer why the task cannot proceed.";

const CONTINUATION_PROMPT: &str = "Using the observations above, continue with the next Thought \
and Action, or give your Final Answer.";

const SUMMARY_PROMPT: &str = "You have used all available reasoning steps. Summarize what you \
found and give your best Final Answer now, without calling any more tools.";

const EXHAUSTED_FALLBACK: &str =
    "I reached the reasoning step limit before completing the task. See the steps above for what was attempted.";

/// Loop tuning.
#[derive(Debug, Clone)]
pub struct ReasonerConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_steps: u32,
    pub max_consecutive_errors: u32,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_tokens: 4096,
            temperature: 0.7,
            max_steps: DEFAULT_MAX_STEPS,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
        }
    }
}

/// Transient per-run state; never persisted.
#[derive(Debug, Default)]
struct LoopState {
    step_count: u32,
    consecutive_errors: u32,
    /// Rendered thought/action/observation lines, for audit only.
    reasoning_chain: Vec<String>,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    /// A final answer was produced within the step budget.
    Finished,
    /// The step budget ran out; the answer comes from the forced summary.
    Aborted,
}

/// Result of one reasoning run.
#[derive(Debug)]
pub struct ReactOutcome {
    pub answer: String,
    pub chain: Vec<String>,
    pub steps_used: u32,
    pub status: LoopStatus,
}

/// The loop itself. Single-threaded and synchronous from the caller's view:
/// each iteration blocks on the backend call and then on each tool in the
/// order the parser produced them.
pub struct Reasoner {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    config: ReasonerConfig,
}

impl Reasoner {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, config: ReasonerConfig) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Run the loop for one user message.
    ///
    /// `conversation` already contains the system prompt, prior history and
    /// the user message. Backend faults propagate to the caller, which falls
    /// back to the single-shot path; tool and parse problems never do.
    pub async fn run(&self, mut conversation: Vec<Message>) -> Result<ReactOutcome> {
        let mut state = LoopState::default();

        info!(
            model = %self.config.model,
            max_steps = self.config.max_steps,
            "reasoning loop starting"
        );

        while state.step_count < self.config.max_steps {
            state.step_count += 1;
            debug!(step = state.step_count, "reasoning iteration");

            let response = self.chat(&conversation).await?;
            let text = response.content.unwrap_or_default();
            let parsed = parse_response(&text);

            if parsed.steps.is_empty() && parsed.final_answer.is_none() {
                if state.step_count == 1 {
                    // The model judged the request needed no tools; take the
                    // raw response as a direct answer.
                    debug!("no protocol sections on first iteration, direct answer");
                    return Ok(ReactOutcome {
                        answer: text,
                        chain: state.reasoning_chain,
                        steps_used: state.step_count,
                        status: LoopStatus::Finished,
                    });
                }
                warn!("response had no parseable steps, requesting protocol adherence");
                conversation.push(Message::user(CORRECTION_PROMPT));
                continue;
            }

            let mut executed_any = false;
            let mut last_thought = String::new();

            for step in &parsed.steps {
                if !step.thought.is_empty() {
                    state.reasoning_chain.push(format!("Thought: {}", step.thought));
                    last_thought = step.thought.clone();
                }

                let Some(action) = &step.action else {
                    continue;
                };

                let rendered = render_action(&action.tool, &action.parameters);
                state.reasoning_chain.push(format!("Action: {}", rendered));

                let output = self
                    .tools
                    .execute(&action.tool, action.parameters.clone())
                    .await;
                let observation = output.observation_text();
                state
                    .reasoning_chain
                    .push(format!("Observation: {}", observation));

                if output.success {
                    state.consecutive_errors = 0;
                } else {
                    state.consecutive_errors += 1;
                }

                // the tool message correlates back to this call id
                let call_id = Uuid::new_v4().to_string();
                let mut assistant = Message::assistant(format!(
                    "Thought: {}\nAction: {}",
                    step.thought, rendered
                ));
                assistant.tool_calls = Some(vec![ToolCallDef::new(
                    call_id.as_str(),
                    action.tool.as_str(),
                    action.parameters.clone(),
                )]);
                conversation.push(assistant);
                conversation.push(Message::tool(call_id, &action.tool, observation));
                executed_any = true;
            }

            // Termination: the response carried an answer, or nothing is left
            // pending.
            if parsed.final_answer.is_some() || !parsed.requires_more_actions {
                let answer = parsed
                    .final_answer
                    .or_else(|| (!last_thought.is_empty()).then(|| last_thought.clone()))
                    .unwrap_or(text);
                info!(steps = state.step_count, "reasoning loop finished");
                return Ok(ReactOutcome {
                    answer,
                    chain: state.reasoning_chain,
                    steps_used: state.step_count,
                    status: LoopStatus::Finished,
                });
            }

            if state.consecutive_errors >= self.config.max_consecutive_errors {
                warn!(
                    errors = state.consecutive_errors,
                    "consecutive tool failures, injecting recovery prompt"
                );
                conversation.push(Message::user(RECOVERY_PROMPT));
                // one grace cycle
                state.consecutive_errors = 0;
                continue;
            }

            if executed_any {
                conversation.push(Message::user(CONTINUATION_PROMPT));
            } else {
                // Steps without actions and without a conclusive thought:
                // keep the model's text in the transcript so it does not
                // restate itself blind.
                conversation.push(Message::assistant(text));
                conversation.push(Message::user(CONTINUATION_PROMPT));
            }
        }

        // Step budget exhausted: one forced-summary call, then return
        // whatever text results. This is not a failure; it always yields a
        // user-visible answer.
        warn!(max_steps = self.config.max_steps, "step budget reached, forcing summary");
        conversation.push(Message::user(SUMMARY_PROMPT));

        let response = self.chat(&conversation).await?;
        let text = response.content.unwrap_or_default();
        let parsed = parse_response(&text);
        let answer = parsed
            .final_answer
            .or_else(|| (!text.trim().is_empty()).then(|| text.clone()))
            .unwrap_or_else(|| EXHAUSTED_FALLBACK.to_string());

        Ok(ReactOutcome {
            answer,
            chain: state.reasoning_chain,
            steps_used: self.config.max_steps,
            status: LoopStatus::Aborted,
        })
    }

    async fn chat(&self, conversation: &[Message]) -> Result<scout_provider::ChatResponse> {
        let params = ChatParams {
            model: self.config.model.clone(),
            messages: conversation.to_vec(),
            tools: Vec::new(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        Ok(self.provider.chat(params).await?)
    }
}

//! Reasoning loop behavior tests

mod common;

use async_trait::async_trait;
use common::{AlwaysFailTool, NoopTool, ScriptedProvider};
use scout_agent::tools::{Tool, ToolError, ToolOutput, ToolRegistry};
use scout_agent::{ContextBuilder, LoopStatus, Reasoner, ReasonerConfig};
use scout_provider::Message;
use serde_json::{json, Value};
use std::sync::Arc;

fn config(max_steps: u32) -> ReasonerConfig {
    ReasonerConfig {
        model: "scripted".to_string(),
        max_steps,
        ..Default::default()
    }
}

fn conversation(registry: &ToolRegistry, user: &str) -> Vec<Message> {
    ContextBuilder::new("/tmp/ws").reasoning_messages(registry, Vec::new(), user)
}

#[tokio::test]
async fn test_direct_answer_when_first_response_has_no_steps() {
    let provider = Arc::new(ScriptedProvider::new(vec!["Just a plain reply."]));
    let registry = Arc::new(ToolRegistry::new());
    let reasoner = Reasoner::new(provider.clone(), registry.clone(), config(10));

    let outcome = reasoner
        .run(conversation(&registry, "hello there"))
        .await
        .unwrap();

    assert_eq!(outcome.answer, "Just a plain reply.");
    assert_eq!(outcome.status, LoopStatus::Finished);
    assert_eq!(outcome.steps_used, 1);
    assert_eq!(provider.call_count(), 1);
}

/// Stand-in for a file pattern tool with a canned result.
struct GlobStub;

#[async_trait]
impl Tool for GlobStub {
    fn name(&self) -> &str {
        "Glob"
    }
    fn description(&self) -> &str {
        "Find files matching a glob pattern."
    }
    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": { "pattern": { "type": "string" } } })
    }
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        assert_eq!(args["pattern"], "**/*.ts");
        Ok(ToolOutput::success(
            json!({ "files": ["a.ts", "b.ts"], "count": 2 }),
        ))
    }
}

#[tokio::test]
async fn test_end_to_end_find_typescript_files() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        "Thought: I should list TypeScript files\nAction: Glob(pattern=\"**/*.ts\")",
        "Thought: The search returned two files\nFinal Answer: The project contains a.ts and b.ts.",
    ]));
    let mut registry = ToolRegistry::new();
    registry.register(GlobStub);
    let registry = Arc::new(registry);
    let reasoner = Reasoner::new(provider.clone(), registry.clone(), config(10));

    let outcome = reasoner
        .run(conversation(
            &registry,
            "find all TypeScript files in the project",
        ))
        .await
        .unwrap();

    assert_eq!(outcome.status, LoopStatus::Finished);
    assert!(outcome.steps_used <= 3);
    assert!(outcome.answer.contains("a.ts"));
    assert!(outcome.answer.contains("b.ts"));

    // the observation was fed back to the model on the second round
    let second_request = provider.request_texts(1).join("\n");
    assert!(second_request.contains("a.ts"));
    assert!(second_request.contains("b.ts"));

    // audit chain has all three phases
    let chain = outcome.chain.join("\n");
    assert!(chain.contains("Thought: I should list TypeScript files"));
    assert!(chain.contains("Action: Glob("));
    assert!(chain.contains("Observation:"));
}

#[tokio::test]
async fn test_termination_bound_when_model_never_concludes() {
    // the model keeps requesting actions forever
    let provider = Arc::new(ScriptedProvider::new(vec![
        "Thought: still looking\nAction: noop(x=1)",
    ]));
    let mut registry = ToolRegistry::new();
    registry.register(NoopTool);
    let registry = Arc::new(registry);
    let reasoner = Reasoner::new(provider.clone(), registry.clone(), config(3));

    let outcome = reasoner
        .run(conversation(&registry, "loop forever"))
        .await
        .unwrap();

    assert_eq!(outcome.status, LoopStatus::Aborted);
    assert_eq!(outcome.steps_used, 3);
    assert!(!outcome.answer.trim().is_empty());
    // max_steps iterations plus exactly one forced-summary call
    assert_eq!(provider.call_count(), 4);

    // the summary request carries the forcing prompt
    let last_request = provider.request_texts(3).join("\n");
    assert!(last_request.contains("Summarize"));
}

#[tokio::test]
async fn test_recovery_prompt_at_exactly_the_error_bound() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        "Thought: trying again\nAction: always_fail(x=1)",
    ]));
    let mut registry = ToolRegistry::new();
    registry.register(AlwaysFailTool);
    let registry = Arc::new(registry);
    let reasoner = Reasoner::new(provider.clone(), registry.clone(), config(6));

    let outcome = reasoner
        .run(conversation(&registry, "do the impossible"))
        .await
        .unwrap();
    assert!(!outcome.answer.is_empty());

    let has_recovery = |n: usize| {
        provider
            .request_texts(n)
            .iter()
            .any(|t| t.contains("Diagnose what went wrong"))
    };

    // failures 1 and 2 do not trigger recovery, the 3rd does
    assert!(!has_recovery(1));
    assert!(!has_recovery(2));
    assert!(has_recovery(3));
}

#[tokio::test]
async fn test_failed_tool_becomes_observation_not_crash() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        "Thought: poke it\nAction: always_fail(x=1)",
        "Final Answer: the tool is broken",
    ]));
    let mut registry = ToolRegistry::new();
    registry.register(AlwaysFailTool);
    let registry = Arc::new(registry);
    let reasoner = Reasoner::new(provider.clone(), registry.clone(), config(10));

    let outcome = reasoner
        .run(conversation(&registry, "poke the tool"))
        .await
        .unwrap();

    assert_eq!(outcome.answer, "the tool is broken");
    let second_request = provider.request_texts(1).join("\n");
    assert!(second_request.contains("deliberate failure"));
}

#[tokio::test]
async fn test_unknown_tool_becomes_observation() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        "Thought: use a tool that does not exist\nAction: teleport(to=\"moon\")",
        "Final Answer: no such tool",
    ]));
    let registry = Arc::new(ToolRegistry::new());
    let reasoner = Reasoner::new(provider.clone(), registry.clone(), config(10));

    let outcome = reasoner
        .run(conversation(&registry, "teleport me"))
        .await
        .unwrap();

    assert_eq!(outcome.answer, "no such tool");
    let second_request = provider.request_texts(1).join("\n");
    assert!(second_request.contains("tool not found"));
}

#[tokio::test]
async fn test_protocol_correction_on_later_malformed_response() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        "Thought: start\nAction: noop(x=1)",
        "free prose with no protocol markers at all",
        "Final Answer: finished",
    ]));
    let mut registry = ToolRegistry::new();
    registry.register(NoopTool);
    let registry = Arc::new(registry);
    let reasoner = Reasoner::new(provider.clone(), registry.clone(), config(10));

    let outcome = reasoner
        .run(conversation(&registry, "run the noop tool"))
        .await
        .unwrap();

    assert_eq!(outcome.answer, "finished");
    // the third request contains the protocol-correction instruction
    let third_request = provider.request_texts(2).join("\n");
    assert!(third_request.contains("did not follow the required format"));
}

#[tokio::test]
async fn test_provider_fault_propagates_to_caller() {
    let provider = Arc::new(common::FailingProvider { kind: "api" });
    let registry = Arc::new(ToolRegistry::new());
    let reasoner = Reasoner::new(provider, registry.clone(), config(10));

    let result = reasoner.run(conversation(&registry, "anything")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_long_conclusive_thought_finishes_the_loop() {
    let long_thought = format!("Thought: {}", "the project structure is now clear and ".repeat(5));
    let provider = Arc::new(ScriptedProvider::new(vec![long_thought.as_str()]));
    let registry = Arc::new(ToolRegistry::new());
    let reasoner = Reasoner::new(provider.clone(), registry.clone(), config(10));

    let outcome = reasoner
        .run(conversation(&registry, "inspect the project"))
        .await
        .unwrap();

    assert_eq!(outcome.status, LoopStatus::Finished);
    assert_eq!(provider.call_count(), 1);
    assert!(outcome.answer.contains("project structure"));
}

//! Context builder for agent prompts

use chrono::Local;
use scout_provider::Message;
use std::path::{Path, PathBuf};

use crate::tools::ToolRegistry;

/// Builds system prompts and message lists.
pub struct ContextBuilder {
    workspace: PathBuf,
}

impl ContextBuilder {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
        }
    }

    /// System prompt declaring the Thought/Action/Observation protocol and
    /// the tool catalogue.
    pub fn reasoning_prompt(&self, tools: &ToolRegistry) -> String {
        let catalogue = tools
            .list()
            .iter()
            .map(|t| format!("- {}: {}", t.name, t.description))
            .collect::<Vec<_>>()
            .join("\n");

        let now = Local::now().format("%Y-%m-%d %H:%M (%A)");

        format!(
            r#"You are scout, an AI agent working in a terminal. You solve tasks by reasoning in explicit steps and calling tools.

Respond using exactly this format:

Thought: what you are thinking and why
Action: tool_name(param="value", other=123)
Observation: (filled in for you with the tool result)

Repeat Thought/Action as needed. When you have enough information, finish with:

Final Answer: your conclusion for the user

Rules:
- One Action per Thought. Wait for the Observation before continuing.
- Only use tools from the list below, with the parameters they document.
- If the task needs no tools, give the Final Answer immediately.

Available tools:
{catalogue}

Current time: {now}
Workspace: {workspace}"#,
            catalogue = catalogue,
            now = now,
            workspace = self.workspace.display(),
        )
    }

    /// System prompt for the single-shot path.
    pub fn single_shot_prompt(&self) -> String {
        format!(
            "You are scout, a helpful AI assistant working in a terminal. \
Be concise and practical. Workspace: {}",
            self.workspace.display()
        )
    }

    /// Full conversation for a reasoning run.
    pub fn reasoning_messages(
        &self,
        tools: &ToolRegistry,
        history: Vec<Message>,
        user_message: &str,
    ) -> Vec<Message> {
        let mut messages = vec![Message::system(self.reasoning_prompt(tools))];
        messages.extend(history);
        messages.push(Message::user(user_message));
        messages
    }

    /// Full conversation for a single-shot request.
    pub fn single_shot_messages(&self, history: Vec<Message>, user_message: &str) -> Vec<Message> {
        let mut messages = vec![Message::system(self.single_shot_prompt())];
        messages.extend(history);
        messages.push(Message::user(user_message));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::register_default_tools;

    #[test]
    fn test_reasoning_prompt_lists_tools() {
        let mut tools = ToolRegistry::new();
        register_default_tools(&mut tools, Path::new("/tmp/ws"));
        let builder = ContextBuilder::new("/tmp/ws");

        let prompt = builder.reasoning_prompt(&tools);
        assert!(prompt.contains("Thought:"));
        assert!(prompt.contains("Final Answer:"));
        assert!(prompt.contains("- read_file:"));
        assert!(prompt.contains("- exec:"));
        assert!(prompt.contains("/tmp/ws"));
    }

    #[test]
    fn test_message_assembly_order() {
        let tools = ToolRegistry::new();
        let builder = ContextBuilder::new("/tmp/ws");
        let history = vec![Message::user("before"), Message::assistant("earlier reply")];

        let messages = builder.reasoning_messages(&tools, history, "now");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].text(), "before");
        assert_eq!(messages[3].text(), "now");
    }
}

//! scout command implementations

use anyhow::Result;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use scout_agent::tools::{register_default_tools, ToolRegistry};
use scout_agent::{Agent, AgentOptions, AgentReply};
use scout_config::Config;
use scout_provider::OpenAiProvider;
use scout_session::SessionManager;

/// Initialize config and workspace
pub async fn init_command() -> Result<()> {
    println!("Initializing scout...");

    let config = scout_config::init().await?;
    let workspace = config.workspace_path();
    tokio::fs::create_dir_all(&workspace).await?;
    tokio::fs::create_dir_all(scout_config::sessions_dir()).await?;

    println!("Config:    {}", scout_config::config_path().display());
    println!("Workspace: {}", workspace.display());
    println!("\nNext steps:");
    println!("  1. Add your API key to {}", scout_config::config_path().display());
    println!("  2. Start chatting: scout chat -m \"list the files in my workspace\"");

    Ok(())
}

/// Show status
pub async fn status_command() -> Result<()> {
    let config_path = scout_config::config_path();
    let workspace = scout_config::workspace_path();

    println!("scout status");
    println!("------------");
    println!(
        "Config:    {} {}",
        config_path.display(),
        if config_path.exists() { "[ok]" } else { "[missing]" }
    );
    println!(
        "Workspace: {} {}",
        workspace.display(),
        if workspace.exists() { "[ok]" } else { "[missing]" }
    );

    if config_path.exists() {
        let config = Config::load().await?;
        println!("Model:     {}", config.default_model());
        println!(
            "API key:   {}",
            if config.has_api_key() { "[set]" } else { "[missing]" }
        );
        println!("Max steps: {}", config.defaults.max_steps);
    }

    Ok(())
}

fn build_agent(config: &Config) -> Agent {
    let provider = Arc::new(OpenAiProvider::new(
        config.api_key().unwrap_or_default(),
        config.api_base(),
        Some(config.default_model()),
    ));

    let workspace = config.workspace_path();
    let mut tools = ToolRegistry::new();
    register_default_tools(&mut tools, &workspace);

    Agent::new(
        provider,
        Arc::new(tools),
        &workspace,
        AgentOptions {
            model: config.default_model(),
            max_tokens: config.defaults.max_tokens,
            temperature: config.defaults.temperature,
            max_steps: config.defaults.max_steps,
            max_consecutive_errors: config.defaults.max_consecutive_errors,
            response_cache_ttl: Duration::from_secs(config.cache.response_ttl_secs),
            response_cache_capacity: config.cache.response_capacity,
            ..Default::default()
        },
    )
}

/// Chat with the agent, one-shot or interactive
pub async fn chat_command(message: Option<String>, session_id: String) -> Result<()> {
    let config = Config::load().await?;
    let workspace = config.workspace_path();
    tokio::fs::create_dir_all(&workspace).await?;

    let agent = build_agent(&config);
    let mut sessions = SessionManager::with_max_messages(
        scout_config::sessions_dir(),
        config.session_max_messages(),
    );

    if let Some(msg) = message {
        let reply = run_turn(&agent, &mut sessions, &session_id, &msg, &config).await?;
        println!("{}", reply.text);
        return Ok(());
    }

    println!("scout interactive mode (type 'exit' to quit)");
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }

        let reply = run_turn(&agent, &mut sessions, &session_id, input, &config).await?;
        println!("\n{}\n", reply.text);
    }

    Ok(())
}

/// One conversational turn: history in, reply out, session updated and saved.
async fn run_turn(
    agent: &Agent,
    sessions: &mut SessionManager,
    session_id: &str,
    input: &str,
    config: &Config,
) -> Result<AgentReply> {
    let history = {
        let session = sessions.get_or_create(session_id).await;
        session.get_history(config.session_max_messages())
    };

    let reply = agent.process(input, history).await;

    let session = sessions.get_or_create(session_id).await;
    session.add_message("user", input);

    if reply.chain.is_empty() {
        session.add_message("assistant", &reply.text);
    } else {
        let mut extra = HashMap::new();
        extra.insert(
            "reasoning_chain".to_string(),
            serde_json::json!(reply.chain),
        );
        extra.insert("steps".to_string(), serde_json::json!(reply.steps_used));
        session.add_message_with_extra("assistant", &reply.text, extra);
    }

    let snapshot = session.clone();
    if let Err(e) = sessions.save(&snapshot).await {
        tracing::warn!("failed to save session {}: {}", session_id, e);
    }

    Ok(reply)
}

//! scout - an interactive terminal agent

use clap::{Parser, Subcommand};
use tracing::error;

mod commands;

use commands::{chat_command, init_command, status_command};

/// scout - AI agent for your terminal
#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "An interactive terminal agent with tool use")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and workspace
    Init,
    /// Chat with the agent
    Chat {
        /// Message to send; omit for interactive mode
        #[arg(short, long)]
        message: Option<String>,
        /// Session ID
        #[arg(short, long, default_value = "default")]
        session: String,
    },
    /// Show system status
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("debug").init();
    } else {
        tracing_subscriber::fmt::init();
    }

    match cli.command {
        Commands::Init => {
            if let Err(e) = init_command().await {
                error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Chat { message, session } => {
            if let Err(e) = chat_command(message, session).await {
                error!("chat failed: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Status => {
            if let Err(e) = status_command().await {
                error!("status failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}

// ABOUTME: aviary CLI entry point.
// ABOUTME: Provides init, run, and chat subcommands.

use aviary::{run_chat, run_daemon, run_init, ChatOptions, DaemonOptions};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aviary")]
#[command(about = "Supervisor for isolated conversational agents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new aviary configuration
    Init,
    /// Run the supervision daemon
    Run {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Start an agent, send one message, print the reply
    Chat {
        /// Agent identifier
        agent_id: String,
        /// Message to send
        message: String,
        /// Provider selector override
        #[arg(long)]
        provider: Option<String>,
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (ignore errors if not found)
    let _ = dotenvy::dotenv();

    aviary_log::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => run_init(),
        Commands::Run {
            config: config_path,
        } => run_daemon(DaemonOptions { config_path }).await,
        Commands::Chat {
            agent_id,
            message,
            provider,
            config: config_path,
        } => {
            run_chat(ChatOptions {
                agent_id,
                message,
                provider,
                config_path,
            })
            .await
        }
    }
}

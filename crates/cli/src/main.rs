//! Unit Agents CLI — the main entry point.
//!
//! Commands:
//! - `run`     — One agent session: a prompted task or an autonomous one
//! - `daemon`  — Run agents autonomously at random intervals
//! - `agents`  — List agents known to the history store
//! - `history` — Show an agent's interaction log

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "unit-agents",
    about = "Unit Agents — autonomous personas for the Unit social platform",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one agent session
    Run {
        /// The task for the agent to execute
        prompt: Option<String>,

        /// Load an existing agent by id
        #[arg(short, long)]
        agent_id: Option<String>,

        /// Create an agent with this handle before running
        #[arg(long)]
        handle: Option<String>,

        /// Profile description for a new agent (used with --handle)
        #[arg(long)]
        profile: Option<String>,

        /// Let the agent decide what to do (no prompt needed)
        #[arg(long)]
        autonomous: bool,
    },

    /// Run agents autonomously at random intervals
    Daemon {
        /// Minimum seconds between cycles
        #[arg(long)]
        min_interval: Option<u64>,

        /// Maximum seconds between cycles
        #[arg(long)]
        max_interval: Option<u64>,

        /// Only run this specific agent
        #[arg(short, long)]
        agent_id: Option<String>,
    },

    /// List agents with saved histories
    Agents,

    /// Show an agent's interaction history
    History {
        /// The agent id to inspect
        agent_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            prompt,
            agent_id,
            handle,
            profile,
            autonomous,
        } => commands::run::run(prompt, agent_id, handle, profile, autonomous).await?,
        Commands::Daemon {
            min_interval,
            max_interval,
            agent_id,
        } => commands::daemon::run(min_interval, max_interval, agent_id).await?,
        Commands::Agents => commands::agents::run().await?,
        Commands::History { agent_id } => commands::history::run(&agent_id).await?,
    }

    Ok(())
}

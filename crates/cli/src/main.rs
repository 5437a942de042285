//! aigentd CLI — the main entry point.
//!
//! Commands:
//! - `serve` — Start the HTTP API gateway
//! - `seed`  — Load a fixture of prompts, aigents, tools, and users
//! - `chat`  — Process one message in-process and print the answer

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "aigentd",
    about = "aigentd — LLM aigent chat backend",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML configuration file
    #[arg(short, long, global = true, env = "AIGENTD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Load a seed fixture into the store
    Seed {
        /// Path to the JSON fixture file
        #[arg(short, long, default_value = "fixtures/initial_data.json")]
        fixture: PathBuf,

        /// Replace records that already exist
        #[arg(long)]
        overwrite: bool,
    },

    /// Process one message in-process and print the answer
    Chat {
        /// Acting user id
        #[arg(short, long, default_value_t = 1)]
        user: i64,

        /// The message to send
        #[arg(short, long)]
        message: String,
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

    let config = commands::load_config(cli.config)?;

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Seed { fixture, overwrite } => {
            commands::seed::run(config, fixture, overwrite).await?
        }
        Commands::Chat { user, message } => commands::chat::run(config, user, message).await?,
    }

    Ok(())
}

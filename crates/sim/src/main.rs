//! Headless battle simulator.
//!
//! Loads battle content from a data directory and fights an encounter with
//! both sides driven by the decision engine.
//! Run with: `battle-sim run --encounter frost_cavern`

mod commands;
mod config;
mod report;

use anyhow::Result;
use clap::Parser;
use commands::{Check, Run};

/// Headless battle simulator
#[derive(Parser)]
#[command(name = "battle-sim")]
#[command(about = "Run turn-based battles from content files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Fight one encounter to the end
    Run(Run),

    /// Load and validate a content directory
    Check(Check),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for BATTLE_CONTENT_DIR and BATTLE_SEED)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::SimConfig::from_env();

    match cli.command {
        Command::Run(cmd) => cmd.execute(&config),
        Command::Check(cmd) => cmd.execute(&config),
    }
}

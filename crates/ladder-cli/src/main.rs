//! Ladder CLI - Run ladder rules over JSON snapshots
//!
//! Each subcommand reads one JSON input file, runs a single engine operation
//! and prints the result as JSON on stdout. Logs go to stderr, filtered by
//! `RUST_LOG` (default `info`).
//!
//! # Quick Start
//!
//! ```bash
//! ladder evaluate --input request.json
//! ladder resolve --input match.json --config league.json
//! ladder prizes --input period.json
//! ladder config > league.json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod input;

/// Ladder CLI - challenge ladder rules engine
#[derive(Parser)]
#[command(name = "ladder")]
#[command(version)]
#[command(about = "Evaluate, resolve and settle challenge ladder operations", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// League configuration JSON (defaults apply to missing fields)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a challenge may be issued
    Evaluate {
        /// Eligibility request JSON
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Apply a match result to a roster
    Resolve {
        /// Roster, challenge and outcome JSON
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Complete an accepted challenge: new roster, match record, immunity
    Complete {
        /// Challenge, players, roster and outcome JSON
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Record a decline and apply the decline swap
    Decline {
        /// Challenge, defender and roster JSON
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Re-evaluate a player's rating against bracket bounds
    Bracket {
        /// Player, grace record and bracket table JSON
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Split a period prize pool
    Prizes {
        /// Period funding, optionally with opening and closing standings
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = input::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Evaluate { input } => commands::evaluate(&config, &input),
        Commands::Resolve { input } => commands::resolve(&input),
        Commands::Complete { input } => commands::complete(&config, &input),
        Commands::Decline { input } => commands::decline(&config, &input),
        Commands::Bracket { input } => commands::bracket(&config, &input),
        Commands::Prizes { input } => commands::prizes(&config, &input),
        Commands::Config => input::print_json(&config),
    }
}

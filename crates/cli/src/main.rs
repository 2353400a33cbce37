//! LiveProof CLI — the main entry point.
//!
//! Commands:
//! - `demo`    — Run a scripted editing session over in-memory frames
//! - `config`  — Validate and print the effective editor configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "liveproof",
    about = "LiveProof — cross-document sync engine for visually edited mailers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a liveproof.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted postcard editing session and print the durable edits
    Demo,

    /// Validate and print the effective configuration
    Config,
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
        Commands::Demo => commands::demo::run(cli.config.as_deref()).await?,
        Commands::Config => commands::config_cmd::run(cli.config.as_deref()).await?,
    }

    Ok(())
}

//! Miniwallet - custodial multi-asset wallet behind an upgradeable proxy
//!
//! Runs a local deployment described by the configuration file and replays
//! batches of wallet calls against it.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use miniwallet::cli::commands;
use miniwallet::config::Config;

/// Miniwallet - custodial wallet with upgradeable logic
#[derive(Parser)]
#[command(name = "miniwallet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "miniwallet.toml", env = "MINIWALLET_CONFIG")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON batch of wallet calls against a fresh deployment
    Run {
        /// Batch file (JSON array of operations)
        batch: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show current configuration
    Config,

    /// Show genesis balances of every configured account
    Balances,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing; logs go to stderr so reports stay clean on stdout
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("miniwallet=info".parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded from {}", cli.config);

    let result = match cli.command {
        Commands::Run { batch, output } => commands::run(&config, &batch, output.as_deref()).await,
        Commands::Config => commands::show_config(&config),
        Commands::Balances => commands::balances(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{AddCommand, ConfigCommand, DeleteCommand, ListCommand, StatusCommand, StoreCommand};
use config::Config;
use mood_diary::{JsonBinClient, SyncController};

#[derive(Parser)]
#[command(name = "diary")]
#[command(version)]
#[command(about = "A mood and symptom diary with cloud sync", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List diary entries
    List(ListCommand),

    /// Add or replace the entry for a date
    Add(AddCommand),

    /// Delete the entry for a date
    Delete(DeleteCommand),

    /// Show where the diary is stored
    Status(StatusCommand),

    /// Manage the saved store configuration
    Store(StoreCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("DIARY_LOG")
                .unwrap_or_else(|_| "mood_diary=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_controller(config: &Config) -> SyncController {
    let remote = JsonBinClient::new(config.endpoint.value.clone());
    SyncController::new(config.store.clone(), config.local_store(), Box::new(remote))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Save config path for init command
    let cli_config_path = cli.config.clone();

    let config = Config::load(cli.config)?;
    tracing::debug!("Using data dir {}", config.data_dir.value.display());

    match &cli.command {
        Some(Commands::List(cmd)) => {
            cmd.run(&mut build_controller(&config)).await?;
        }
        Some(Commands::Add(cmd)) => {
            cmd.run(&mut build_controller(&config)).await?;
        }
        Some(Commands::Delete(cmd)) => {
            cmd.run(&mut build_controller(&config)).await?;
        }
        Some(Commands::Status(cmd)) => {
            cmd.run(&mut build_controller(&config)).await?;
        }
        Some(Commands::Store(cmd)) => {
            cmd.run(&config)?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config, cli_config_path)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

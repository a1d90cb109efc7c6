// src/bin/cli.rs

//! Workshop Scanner CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use scanner::{
    error::Result,
    models::Config,
    pipeline::{self, Scanner},
    storage::{AuthorLinkStore, CursorStore, LocalStorage},
    utils::log as report,
};

/// Steam Workshop Scanner - announces new and updated mods
#[derive(Parser, Debug)]
#[command(
    name = "scanner",
    version,
    about = "Steam Workshop change scanner"
)]
struct Cli {
    /// Path to storage directory containing config and state files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single crawl cycle
    Run,

    /// Run crawl cycles on the configured interval until interrupted
    Watch {
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<usize>,
    },

    /// Link a community profile to a Discord account
    Link {
        /// Profile path, `id/<vanity>` or `profiles/<steamid64>`
        steam_id: String,
        discord_id: String,
    },

    /// Remove every link pointing at a Discord account
    Unlink { discord_id: String },

    /// Validate configuration file
    Validate,

    /// Show cursor and tracked mod count
    Info,
}

/// Initialize logging from the verbosity flag or the configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.storage_dir.join("config.toml");
    let config_exists = config_path.exists();
    let level = Config::load(&config_path)
        .map(|config| config.logging.level)
        .unwrap_or_else(|_| "info".to_string());
    init_logging(cli.verbose, &level);

    log::info!("Workshop scanner starting...");

    let mut config = Config::load_or_default(&config_path);
    config.apply_env();
    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    let storage = Arc::new(LocalStorage::new(&cli.storage_dir));

    match cli.command {
        Command::Run => {
            report::header("Workshop crawl cycle");
            let mut scanner = Scanner::from_config(config, storage)?;
            let outcome = scanner.run().await?;
            report::summary("Cycle", &outcome.summary_items());
        }

        Command::Watch { cycles } => {
            let period = Duration::from_secs(config.schedule.interval_secs);
            let mut scanner = Scanner::from_config(config, storage)?;

            report::header(&format!("Watching the workshop every {}s", period.as_secs()));
            tokio::select! {
                ran = pipeline::watch(&mut scanner, period, cycles) => {
                    log::info!("Stopped after {} cycles", ran);
                }
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    log::info!("Interrupted, shutting down");
                }
            }
        }

        Command::Link {
            steam_id,
            discord_id,
        } => {
            if storage.insert(&steam_id, &discord_id).await? {
                log::info!("Linked {} to {}", steam_id, discord_id);
            } else {
                log::warn!("{} is already linked, unlink it first", steam_id);
            }
        }

        Command::Unlink { discord_id } => {
            let removed = storage.delete_by_discord_id(&discord_id).await?;
            log::info!("Removed {} link(s) to {}", removed, discord_id);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if config_exists {
                Config::load(&config_path)
                    .inspect_err(|e| log::error!("Config load failed: {}", e))?;
            } else {
                log::warn!("No config at {}, validating defaults", config_path.display());
            }
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!(
                "Config: {}",
                if config_exists { "exists" } else { "not found" }
            );
            log::info!("Cursor: page {}", CursorStore::get(storage.as_ref()).await?);
            log::info!("Tracked mods: {}", storage.tracked_mods().await?);
        }
    }

    log::info!("Done!");

    Ok(())
}

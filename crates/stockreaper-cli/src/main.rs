use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockreaper_core::{storage::Database, AppConfig, Extension};

mod commands;

#[derive(Parser)]
#[command(name = "stockreaper")]
#[command(author, version, about = "Deletes products that have been out of stock for too long")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (defaults to ~/.config/stockreaper/config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete stale out-of-stock products now
    Reap {
        /// Override the configured staleness threshold
        #[arg(short = 't', long)]
        threshold_days: Option<u32>,
        /// Only list the products that would be deleted
        #[arg(long)]
        dry_run: bool,
    },
    /// Schedule the daily reaper job
    Activate,
    /// Remove the daily reaper job
    Deactivate,
    /// Show the reaper job schedule
    Status,
    /// Run the scheduler in the foreground until Ctrl+C
    Daemon,
    /// Show the admin product listing
    List {
        /// Column to sort by (e.g. days_out_of_stock, title, modified)
        #[arg(long)]
        orderby: Option<String>,
        /// asc or desc
        #[arg(long)]
        order: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let config = Arc::new(config);

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Initialize database and wire the extension
    let db = Arc::new(Database::new(&config).await?);
    let extension = Extension::new(db, config.clone())?;

    match cli.command {
        Commands::Reap {
            threshold_days,
            dry_run,
        } => commands::reap::run(&extension, threshold_days, dry_run).await,
        Commands::Activate => commands::schedule::activate(&extension).await,
        Commands::Deactivate => commands::schedule::deactivate(&extension).await,
        Commands::Status => commands::schedule::status(&extension).await,
        Commands::Daemon => commands::daemon::start(&extension).await,
        Commands::List { orderby, order } => commands::list::run(&extension, orderby, order).await,
    }
}

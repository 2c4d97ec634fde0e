//! Freezer - buildpack fetcher with a local cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use freezer::cli::{Cli, Commands};
use freezer::config::ConfigManager;
use freezer::error::FreezerResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> FreezerResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let settings = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("freezer=warn"),
        1 => EnvFilter::new("freezer=info"),
        _ => EnvFilter::new("freezer=debug"),
    };

    // stdout is reserved for command output
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if settings.general.json_logs() {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }
    debug!("Settings loaded from {}", config_manager.path().display());

    match cli.command {
        Commands::Stock(args) => freezer::cli::commands::stock(args, &settings).await,
        Commands::Cache(args) => freezer::cli::commands::cache(args, &settings).await,
        Commands::Config(args) => {
            freezer::cli::commands::config(args, &settings, &config_manager).await
        }
    }
}

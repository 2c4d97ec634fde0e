//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Freezer - buildpack fetcher with a local cache
///
/// Downloads buildpacks published as GitHub release assets and keeps
/// them in an on-disk cache so repeated builds skip the network.
#[derive(Parser, Debug)]
#[command(name = "freezer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Settings file path
    #[arg(short, long, global = true, env = "FREEZER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a buildpack into the cache and print its local path
    Stock(StockArgs),

    /// Inspect or clear the buildpack cache
    Cache(CacheArgs),

    /// Show settings
    Config(ConfigArgs),
}

/// Arguments for the stock command
///
/// `--org` and `--repo` are validated by the command itself so that a
/// missing value is reported like every other configuration error.
#[derive(Parser, Debug, Clone)]
pub struct StockArgs {
    /// Organization publishing the buildpack (eg. cloudfoundry) (required)
    #[arg(long, default_value = "", hide_default_value = true)]
    pub org: String,

    /// Repository of the buildpack (eg. nodejs-cnb) (required)
    #[arg(long, default_value = "", hide_default_value = true)]
    pub repo: String,

    /// Cache directory on disk [default: $HOME/.freezer-cache]
    #[arg(long)]
    pub cache_directory: Option<PathBuf>,

    /// Git endpoint URL [default: https://api.github.com]
    #[arg(long)]
    pub git_endpoint: Option<String>,

    /// Personal GitHub token to prevent rate limiting [default: $GITHUB_TOKEN]
    #[arg(long)]
    pub github_token: Option<String>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached buildpacks
    List {
        /// Cache directory on disk [default: $HOME/.freezer-cache]
        #[arg(long)]
        cache_directory: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove every cached buildpack
    Clear {
        /// Cache directory on disk [default: $HOME/.freezer-cache]
        #[arg(long)]
        cache_directory: Option<PathBuf>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective settings
    Show,

    /// Show settings file path
    Path,
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

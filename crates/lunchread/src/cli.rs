//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// lunchread - Generate bilingual lunch read articles
#[derive(Parser, Debug)]
#[command(name = "lunchread")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a config file (defaults to ~/.lunchread/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a lunch read and add it to the content file
    Generate(GenerateArgs),

    /// Validate the API key and connection
    Check(CheckArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// API credentials shared by commands that call the API
#[derive(Args, Debug)]
pub struct ApiKeyArgs {
    /// Messages API key
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

// Generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub api: ApiKeyArgs,

    /// Content file to update (overrides config)
    #[arg(long)]
    pub content_file: Option<Utf8PathBuf>,

    /// Topic name instead of a random pick
    #[arg(long)]
    pub topic: Option<String>,

    /// Skip git add/commit/push
    #[arg(long)]
    pub no_git: bool,

    /// Commit but do not push
    #[arg(long)]
    pub no_push: bool,

    /// Do not back up the content file before writing
    #[arg(long)]
    pub no_backup: bool,

    /// Print the formatted entry instead of writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Seed for topic, date and id selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Attempt budget per API call (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Skip the connection check before generating
    #[arg(long)]
    pub skip_check: bool,
}

// Check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub api: ApiKeyArgs,
}

// Config commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration
    Show(ConfigShowArgs),
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

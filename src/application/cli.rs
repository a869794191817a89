// src/application/cli.rs
//
// Command-line surface. Parsing only; handlers live in `commands`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vidledger",
    version,
    about = "Enrich a local video library from the YouTube Data API and track availability",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Configuration file (defaults to {config_dir}/vidledger/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enrich videos of one priority tier
    Run(RunArgs),
    /// Enrich channels, placeholders first
    Channels(ChannelArgs),
    /// Show candidate counts and quota estimates without calling the API
    Status(StatusArgs),
    /// Populate a reference catalog
    Seed(SeedArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// low, medium, high or all (case-insensitive)
    #[arg(long, value_name = "TIER")]
    pub priority: String,

    /// Maximum number of videos to process
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Fetch and reconcile, but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Also re-check videos already marked unavailable
    #[arg(long)]
    pub include_unavailable: bool,

    /// Report path (defaults to a timestamped file in the export directory)
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ChannelArgs {
    /// Maximum number of channels to process
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub include_unavailable: bool,

    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Count unavailable entities as candidates
    #[arg(long)]
    pub include_unavailable: bool,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Catalog to seed
    #[arg(value_enum)]
    pub target: SeedTarget,

    /// Delete the existing catalog first
    #[arg(long)]
    pub force: bool,

    /// Count what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedTarget {
    Topics,
    Categories,
}

//! Clap derive structures for the `devmon` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// devmon -- poll JSON file devices and print their readings
#[derive(Debug, Parser)]
#[command(
    name = "devmon",
    version,
    about = "Poll device state files on a fixed interval",
    long_about = "Polls every device declared in the config file once per interval\n\
        and prints the latest consistent snapshot of their readings.\n\n\
        Devices that fail to read in a cycle are shown as unavailable.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, short = 'c', env = "DEVMON_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON, one document per line
    JsonCompact,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the configured devices and print each new snapshot
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Validate the config file and list the devices it declares
    Check,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit after printing this many snapshots
    #[arg(long, short = 'n')]
    pub count: Option<u64>,

    /// Override the configured polling interval (milliseconds)
    #[arg(long, short = 'i')]
    pub interval_ms: Option<u64>,
}

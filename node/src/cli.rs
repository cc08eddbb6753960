//! # CLI Interface
//!
//! Defines the command-line argument structure for `tally-node` using
//! `clap` derive. Supports three subcommands: `run`, `init`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tally ledger node.
///
/// Serves a single fungible-token ledger over HTTP and JSON-RPC, and
/// exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "tally-node",
    about = "Tally fungible-token ledger node",
    version,
    propagate_version = true
)]
pub struct TallyNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Tally node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Write a fresh configuration file with the token's genesis parameters.
    Init(InitArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the node configuration file (TOML).
    #[arg(long, short = 'c', env = "TALLY_CONFIG", default_value = "tally.toml")]
    pub config: PathBuf,

    /// Overrides `[api] listen_addr`.
    #[arg(long, env = "TALLY_LISTEN")]
    pub listen: Option<String>,

    /// Overrides `[metrics] listen_addr`.
    #[arg(long, env = "TALLY_METRICS_LISTEN")]
    pub metrics_listen: Option<String>,

    /// Overrides `[storage] snapshot_path`.
    #[arg(long, env = "TALLY_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "TALLY_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Where to write the configuration file.
    #[arg(long, short = 'c', env = "TALLY_CONFIG", default_value = "tally.toml")]
    pub config: PathBuf,

    /// Initial owner account (`0x` + 40 hex digits). Receives the whole
    /// initial supply and the mint/burn privilege.
    #[arg(long)]
    pub owner: String,

    /// Token name.
    #[arg(long, default_value = "Tally Token")]
    pub name: String,

    /// Token symbol.
    #[arg(long, default_value = "TLY")]
    pub symbol: String,

    /// Display decimals.
    #[arg(long, default_value_t = tally_ledger::config::DEFAULT_DECIMALS)]
    pub decimals: u8,

    /// Initial supply in base units (decimal or 0x hex).
    #[arg(long, default_value = "50000000000000000000000000")]
    pub initial_supply: String,

    /// Path for the ledger snapshot, written on shutdown.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tally Node
//!
//! Entry point for the `tally-node` binary. Parses CLI arguments, initializes
//! logging and metrics, loads or creates the ledger, and serves the HTTP API.
//!
//! The binary supports three subcommands:
//!
//! - `run`: start the node
//! - `init`: write a configuration file with genesis parameters
//! - `version`: print build version information

mod api;
mod cli;
mod config;
mod logging;
mod metrics;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;

use tally_ledger::{parse_amount, Address, GenesisConfig, LedgerSnapshot, SharedLedger};

use cli::{Commands, TallyNodeCli};
use config::NodeConfig;
use logging::LogFormat;
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TallyNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the node: API server and metrics endpoint, until a shutdown signal.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        logging::DEFAULT_FILTER,
        LogFormat::from_str_lossy(&args.log_format),
    );

    // --- Configuration ---
    let mut config = NodeConfig::load(&args.config)?;
    if let Some(listen) = args.listen {
        config.api.listen_addr = listen;
    }
    if let Some(listen) = args.metrics_listen {
        config.metrics.listen_addr = listen;
    }
    if let Some(path) = args.snapshot {
        config.storage.snapshot_path = Some(path);
    }

    tracing::info!(
        config = %args.config.display(),
        api = %config.api.listen_addr,
        metrics_enabled = config.metrics.enabled,
        "starting tally-node"
    );

    // --- Ledger ---
    let ledger = open_ledger(&config)?;
    let (symbol, supply) = ledger.read(|l| (l.symbol().to_string(), l.total_supply()));
    tracing::info!(
        symbol = %symbol,
        total_supply = %supply,
        sequence = ledger.sequence(),
        "ledger ready"
    );

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());
    node_metrics.ledger_sequence.set(ledger.sequence() as i64);

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        ledger: ledger.clone(),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_listener = tokio::net::TcpListener::bind(&config.api.listen_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", config.api.listen_addr))?;
    tracing::info!("API server listening on {}", config.api.listen_addr);

    // --- Metrics server ---
    let metrics_server = if config.metrics.enabled {
        let metrics_router = axum::Router::new()
            .route("/metrics", axum::routing::get(metrics::metrics_handler))
            .with_state(Arc::clone(&node_metrics));
        let metrics_listener = tokio::net::TcpListener::bind(&config.metrics.listen_addr)
            .await
            .with_context(|| {
                format!(
                    "failed to bind metrics listener on {}",
                    config.metrics.listen_addr
                )
            })?;
        tracing::info!("Metrics server listening on {}", config.metrics.listen_addr);
        Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(metrics_listener, metrics_router).await {
                tracing::error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    if let Some(handle) = metrics_server {
        handle.abort();
    }

    // --- Persist ---
    if let Some(path) = &config.storage.snapshot_path {
        let snapshot = ledger.snapshot();
        snapshot
            .save(path)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            sequence = snapshot.sequence,
            "snapshot written"
        );
    }

    tracing::info!("tally-node stopped");
    Ok(())
}

/// Restores the ledger from the configured snapshot if one exists on disk,
/// otherwise builds it from the `[token]` genesis section.
fn open_ledger(config: &NodeConfig) -> Result<SharedLedger> {
    if let Some(path) = config.storage.snapshot_path.as_deref().filter(|p| p.exists()) {
        let snapshot = LedgerSnapshot::load(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        let ledger = SharedLedger::from_snapshot(snapshot)
            .with_context(|| format!("snapshot {} is inconsistent", path.display()))?;
        tracing::info!(path = %path.display(), "restored ledger from snapshot");
        return Ok(ledger);
    }

    let ledger = config
        .token
        .build()
        .context("invalid genesis configuration")?;
    tracing::info!(owner = %config.token.owner, "created ledger from genesis");
    Ok(SharedLedger::new(ledger))
}

/// Writes a fresh node configuration file.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("tally_node=info", LogFormat::Pretty);

    let owner: Address = args
        .owner
        .parse()
        .with_context(|| format!("invalid --owner {}", args.owner))?;
    let initial_supply = parse_amount(&args.initial_supply)
        .with_context(|| format!("invalid --initial-supply {}", args.initial_supply))?;

    let genesis = GenesisConfig {
        name: args.name,
        symbol: args.symbol,
        decimals: args.decimals,
        initial_supply,
        owner,
    };
    genesis.validate().context("invalid genesis parameters")?;

    let mut config = NodeConfig::with_genesis(genesis);
    config.storage.snapshot_path = args.snapshot;

    write_config(&config, &args.config, args.force)?;
    tracing::info!(path = %args.config.display(), "configuration written");

    println!("Node initialized successfully.");
    println!("  Config file    : {}", args.config.display());
    println!("  Token          : {} ({})", config.token.name, config.token.symbol);
    println!("  Decimals       : {}", config.token.decimals);
    println!("  Initial supply : {}", config.token.initial_supply);
    println!("  Owner          : {}", config.token.owner);

    Ok(())
}

fn write_config(config: &NodeConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }
    config.save(path)
}

/// Prints version information to stdout.
fn print_version() {
    println!("tally-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

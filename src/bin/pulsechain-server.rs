#![forbid(unsafe_code)]
//! PulseChain HTTP server
//!
//! Settings come from `config.toml`, then `HOST`/`PORT` (process environment
//! first, `.env` second), then the flags below.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use pulsechain::api::{run_api_server, Node};
use pulsechain::blockchain::Ledger;
use pulsechain::config::{self, load_config, load_config_with_env, DEFAULT_DOTENV_PATH};
use pulsechain::logging::{init_logging, LogFormat};
use pulsechain::service::LedgerService;

#[derive(Parser, Debug)]
#[command(name = "pulsechain-server", about = "Serve a PulseChain ledger over HTTP", version)]
struct Cli {
    /// Path to the configuration file (TOML). Defaults to ./config.toml.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Interface to bind, overrides `server.host` and `HOST`.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overrides `server.port` and `PORT`.
    #[arg(long, short = 'p')]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config_with_env(path, DEFAULT_DOTENV_PATH)?,
        None => load_config()?,
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config::validate(&config)?;

    init_logging(
        &config.logging.level,
        LogFormat::from_str_lossy(&config.logging.format),
    );

    let ledger = Arc::new(Ledger::new());
    let genesis = ledger.latest();
    tracing::info!(
        genesis_hash = %genesis.hash,
        min_bpm = config.ledger.min_bpm,
        max_bpm = config.ledger.max_bpm,
        "ledger initialized"
    );

    let service = LedgerService::new(ledger, &config.ledger);
    let node = Arc::new(Node::new(service));

    run_api_server(node, &config.server).await?;
    Ok(())
}

//! Restaurant form intake service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──▶ request id ─▶ trace ─▶ timeout ─▶ body limit ─▶ CORS
//!             │
//!             ▼
//!     ┌───────────────┐   ┌──────────────┐   ┌──────────────────────────────┐
//!     │  rate limit   │──▶│   handler    │──▶│ parse → validate → sanitize  │
//!     │ (per policy)  │   │ (form kind)  │   │ → file → persist → notify    │
//!     └───────────────┘   └──────────────┘   └──────────────┬───────────────┘
//!                                                           │
//!     Client Response  ◀──────── envelope ◀─────────────────┘
//!
//!     Cross-cutting: config · observability · security · lifecycle
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use form_intake::config::{load_config, IntakeConfig};
use form_intake::lifecycle::{bootstrap, shutdown_signal, Shutdown};
use form_intake::observability::{logging, metrics};
use form_intake::HttpServer;

#[derive(Parser)]
#[command(name = "form-intake")]
#[command(about = "Form intake API for the restaurant website", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "INTAKE_CONFIG")]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => IntakeConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "form-intake starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        config_file = ?args.config,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let booted = bootstrap(config)?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.trigger();
        }
    });

    HttpServer::new(booted.state).run(listener, receiver).await?;

    if let Err(e) = booted.store.save_to_file() {
        tracing::error!(error = %e, "Failed to save submission snapshot");
    }
    tracing::info!("Shutdown complete");
    Ok(())
}

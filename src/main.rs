//! swc-relay server
//!
//! A store-and-forward HTTP message relay built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     POST /channel/c/data/x1        ┌──────────┐    ┌───────────────┐    ┌──────────────┐
//!     ──────────────────────────────▶│   http   │───▶│    relay      │───▶│   routing    │
//!                                    │  server  │    │   handlers    │    │ route table  │
//!                                    └──────────┘    └───────┬───────┘    └──────┬───────┘
//!                                                            │                   │
//!                                                            ▼                   ▼
//!     GET /channel/c/data/x1         ┌──────────┐    ┌───────────────┐    ┌──────────────┐
//!     ◀──────────────────────────────│ response │◀───│ prefix queue  │◀───│   matched    │
//!                                    │ headers  │    │  (FIFO)       │    │   prefix     │
//!                                    └──────────┘    └───────────────┘    └──────────────┘
//!
//!     Cross-cutting: config, observability (logs + metrics), lifecycle (shutdown)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use swc_relay::config::load_or_default;
use swc_relay::lifecycle::{signals, Shutdown};
use swc_relay::observability::{logging, metrics};
use swc_relay::HttpServer;

#[derive(Parser)]
#[command(name = "swc-relay")]
#[command(about = "Store-and-forward HTTP message relay", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long, env = "SWC_RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init_logging(&config.observability)?;

    tracing::info!("swc-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_size = config.limits.max_body_size,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            signals::wait_for_signal().await;
            shutdown.trigger();
        }
    });

    HttpServer::new(config).run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

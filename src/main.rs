//! Greeting service binary.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ axum (request ID, trace, timeout)
//!                         │
//!                         ▼
//!                  routing::Router ── no match ──▶ 404
//!                         │
//!            ┌────────────┴─────────────┐
//!            ▼                          ▼
//!   ConcurrentBackend            AffineBackend
//!   (runs on request task)       (AffinityQueue → one worker thread)
//!            │                          │
//!            └──────────┬───────────────┘
//!                       ▼
//!              SharedValue<String> (greeting)
//!                       │
//!     Client Response   ▼
//!     ◀────────────── ServerResponse::complete
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use greet_service::config::{load_config, validate_config, ServiceConfig};
use greet_service::lifecycle::signals::spawn_signal_listener;
use greet_service::observability::{logging, metrics};
use greet_service::{build_app, HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "greet-service")]
#[command(about = "Greeting service with concurrent and affine handler backends", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override app.greeting.
    #[arg(short, long)]
    greeting: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(greeting) = args.greeting {
        config.app.greeting = greeting;
    }
    validate_config(&config).map_err(greet_service::config::ConfigError::Validation)?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "greet-service starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        affine_mode = ?config.dispatch.affine_mode,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = build_app(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(&config, app.router);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!(greeting = %app.greeting.get(), "Shutdown complete");
    Ok(())
}

//! APM Demo API
//!
//! A small HTTP API whose every request is instrumented through a fail-soft
//! APM facade.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────┐
//!                   │                    APM DEMO                       │
//!                   │                                                   │
//!   Client Request  │  ┌─────────┐   ┌───────────┐   ┌──────────────┐  │
//!   ────────────────┼─▶│  http   │──▶│ telemetry │──▶│   handlers   │  │
//!                   │  │ server  │   │ middleware│   │              │  │
//!                   │  └─────────┘   └─────┬─────┘   └──────┬───────┘  │
//!                   │                      │                │          │
//!                   │                      ▼                ▼          │
//!                   │              ┌──────────────┐  ┌─────────────┐   │
//!                   │              │  telemetry   │  │  services   │───┼──▶ Upstream API
//!                   │              │   facade     │  │ users/data  │   │
//!                   │              └──────┬───────┘  └─────────────┘   │
//!                   │                     │ (only when enabled)        │
//!                   │                     ▼                            │
//!                   │              ┌──────────────┐                    │
//!                   │              │ APM backend  │────────────────────┼──▶ Prometheus scrape
//!                   │              └──────────────┘                    │
//!                   └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use apm_demo::config::load_config;
use apm_demo::http::HttpServer;
use apm_demo::lifecycle::{self, Shutdown};
use apm_demo::observability::init_logging;

#[derive(Parser)]
#[command(name = "apm-demo")]
#[command(about = "APM-instrumented demo API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    init_logging(&config.logging);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "apm-demo starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        environment = %config.telemetry.environment,
        request_timeout_secs = config.server.request_timeout_secs,
        "Configuration loaded"
    );

    let telemetry = lifecycle::init_telemetry(&config.telemetry);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    lifecycle::signals::spawn_signal_handler(shutdown);

    let server = HttpServer::new(config, telemetry)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

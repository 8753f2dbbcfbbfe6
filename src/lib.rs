//! RaceCapture Dashboard - live vehicle telemetry, recorded and exported.
//!
//! This is the main library crate for the dashboard service. It provides
//! the telemetry store, the simulated sensor feed, recording sessions with
//! CSV export, and the HTTP API that serves them.

pub mod commands;
pub mod config;
pub mod export;
pub mod recorder;
pub mod sensors;
pub mod telemetry;
pub mod utils;

use anyhow::Context;
use commands::AppState;
use config::DashboardConfig;
use sensors::{OscillatorSampler, SensorRegistry};
use std::sync::Arc;
use telemetry::{TelemetryStore, TickScheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "racecapture_dashboard=debug,axum=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the dashboard until Ctrl-C
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting RaceCapture Dashboard v{}", env!("CARGO_PKG_VERSION"));

    let config = DashboardConfig::load().context("Failed to load configuration")?;
    let addr = config.socket_addr()?;

    let store = Arc::new(TelemetryStore::new(
        SensorRegistry::racecapture(),
        OscillatorSampler::racecapture(),
        config.store_options(),
    ));
    let scheduler = TickScheduler::new(Arc::clone(&store), config.tick_interval()).spawn();

    let state = AppState::new(store, config.export_dir.clone());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Serving dashboard API on http://{}", addr);

    axum::serve(listener, commands::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    scheduler.shutdown().await;
    tracing::info!("Dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

//! `checkout-gateway` — HTTP entry point for sealed checkout links.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`](config::Config) from environment variables.
//! 2. Initialise the telemetry pipeline (JSON logs, optional OTLP spans).
//! 3. Parse the secret key used to seal and open checkout tokens.
//! 4. Build the payment API client.
//! 5. Build the Axum router and serve until a shutdown signal arrives.

mod config;
mod server;
mod telemetry;
mod upstream;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use server::state::AppState;
use upstream::HttpCheckoutApi;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = config::Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        "checkout-gateway starting"
    );

    // -----------------------------------------------------------------------
    // 3. Secret key
    // -----------------------------------------------------------------------
    let secret_key = cfg.secret_key()?;
    info!(key_fingerprint = %secret_key.fingerprint(), "secret key loaded");

    // -----------------------------------------------------------------------
    // 4. Payment API client
    // -----------------------------------------------------------------------
    let checkout_api = HttpCheckoutApi::new(&cfg.api_url, cfg.upstream_timeout())?;
    info!(
        api_url = %cfg.api_url,
        timeout_secs = cfg.upstream_timeout_secs,
        "payment API client ready"
    );

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(secret_key, Arc::new(checkout_api), cfg.api_key.clone());
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("checkout-gateway stopped");
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}

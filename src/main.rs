//! event-desk server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use event_desk::config::{AppConfig, LogFormat};
use event_desk::server::{build_app, build_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so LOG_FORMAT can pick the formatter
    let config = AppConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, store = ?config.store, "starting event-desk");

    // Connect backends
    let state = build_state(&config).await?;

    // Build router
    let app = build_app(state, Duration::from_secs(config.request_timeout_secs));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

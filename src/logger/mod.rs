//! Logger module
//!
//! Installs the `tracing` subscriber and keeps the few log lines with a fixed
//! shape: the startup banner and access log entries.

mod format;

pub use format::{AccessLogEntry, AccessLogFormat};

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use crate::config::{AppState, LoggingConfig};

/// Initialize the global subscriber
///
/// `RUST_LOG` takes precedence over `logging.level`. Should be called once at
/// application startup.
pub fn init(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(Into::into)
}

pub fn log_server_start(addr: &SocketAddr, state: &AppState) {
    let config = &state.config;
    tracing::info!("======================================");
    tracing::info!("File server started successfully");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Upload root: {}", state.upload_root.path().display());
    tracing::info!(
        "Upload limit: {} bytes (form field '{}')",
        config.storage.max_upload_size,
        config.storage.form_field
    );
    match config.server.workers {
        Some(workers) => tracing::info!("Worker threads: {workers}"),
        None => tracing::info!("Worker threads: default (CPU cores)"),
    }
    if let Some(max) = config.performance.max_connections {
        tracing::info!("Max connections: {max}");
    }
    for route in state.router.routes() {
        tracing::info!("  {:<4} {}", route.method.as_str(), route.pattern.as_str());
    }
    tracing::info!("======================================");
}

pub fn log_access(entry: &AccessLogEntry, format: AccessLogFormat) {
    tracing::info!(target: "access", "{}", entry.format(format));
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    tracing::warn!("Failed to serve connection: {err}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

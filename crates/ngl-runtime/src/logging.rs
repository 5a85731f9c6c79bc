//! JSON log output.
//!
//! The runtime only emits `tracing` events; applications choose a
//! subscriber. This module installs the one used in production: JSON lines
//! on stdout filtered by `RUST_LOG`, falling back to [`DEFAULT_FILTER`].

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "ngl_runtime=info,ngl_compile=info";

/// Install a global JSON subscriber.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn install_json_subscriber() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(true)
        .try_init()
}

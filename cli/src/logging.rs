#![deny(missing_docs)]

//! # Logging
//!
//! Installs a human-readable `tracing` subscriber on stderr, so stdout stays
//! free for command output.

use scaffold_core::{AppError, AppResult};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Builds the filter from a directive string such as `info` or
/// `scaffold_core=debug,warn`.
pub fn create_env_filter(filter: &str) -> AppResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| AppError::Parse(format!("Invalid log level '{}': {}", filter, e)))
}

/// Initializes the global subscriber.
pub fn init_logging(filter: &str) -> AppResult<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(create_env_filter(filter)?);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Internal(format!("Failed to initialize logging: {}", e)))
}

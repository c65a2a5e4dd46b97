//! Configuration module for the chainlang interpreter
//!
//! Holds the TOML-backed configuration types and the logging setup that reads
//! them.

pub mod types;

pub use types::*;

use tracing_subscriber::EnvFilter;

use crate::runtime::error::{RuntimeError, RuntimeResult};

/// Install a global `tracing` subscriber according to `config`.
///
/// Returns `Ok(false)` when a global subscriber was already installed, so
/// hosts and tests can call it more than once. An invalid filter directive is
/// an error.
pub fn init_logging(config: &LoggingConfig) -> RuntimeResult<bool> {
    let filter = EnvFilter::try_new(&config.filter).map_err(|e| {
        RuntimeError::Config(format!("invalid log filter '{}': {}", config.filter, e))
    })?;

    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .try_init()
        .is_ok())
}

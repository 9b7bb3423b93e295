//! Global setup for CLI initialization

use std::io::IsTerminal;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for logging
///
/// `RUST_LOG` wins over `default_level`, which normally comes from the
/// settings. Events go to stderr so stdout stays machine-readable.
///
/// # Errors
/// Returns an error if `default_level` is not a valid filter or a global
/// subscriber is already installed
pub fn init_tracing(default_level: &str) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .with_context(|| format!("invalid log level {default_level:?}"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}

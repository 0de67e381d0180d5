//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use citypulse_core::error::{CityPulseError, Result};

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `level`. Fails if a subscriber is already
/// installed.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| CityPulseError::internal(format!("logging already initialized: {e}")))
}

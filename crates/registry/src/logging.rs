//! Logging setup and configuration

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Setup a tracing subscriber for the host application.
///
/// `RUST_LOG` overrides `default_level`. Fails (instead of panicking) when
/// the filter is invalid or a global subscriber is already installed, so
/// embedding applications and test harnesses keep control.
pub fn setup_logging(default_level: &str) -> crate::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| crate::Error::Config(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .map_err(|e| crate::Error::Config(format!("Failed to install subscriber: {}", e)))?;

    Ok(())
}

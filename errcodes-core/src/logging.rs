//! Process-wide tracing setup.

use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level when set. Fails if
/// a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("invalid log level '{}'", config.level))?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
            .context("failed to install JSON tracing subscriber")?;
    } else {
        registry
            .with(fmt::layer().with_target(true))
            .try_init()
            .context("failed to install tracing subscriber")?;
    }

    Ok(())
}


//! Tracing subscriber setup

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Install a global subscriber according to `config`
///
/// `RUST_LOG` takes precedence over `config.level`. Calling this when a
/// subscriber is already installed leaves the existing one in place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    config.validate()?;
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| Error::config(format!("Invalid logging level '{}': {}", config.level, e)))?,
    };

    let installed = if config.json {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(env_filter);

        tracing_subscriber::registry().with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_filter(env_filter);

        tracing_subscriber::registry().with(fmt_layer).try_init()
    };

    if installed.is_err() {
        tracing::debug!("global subscriber already installed");
    }
    Ok(())
}

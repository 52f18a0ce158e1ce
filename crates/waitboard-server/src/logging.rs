//! Structured logging setup via `tracing-subscriber`.
//!
//! `RUST_LOG` wins when set; otherwise `logging.level` from the config
//! is used as the filter.

use tracing_subscriber::EnvFilter;
use waitboard_core::config::{LogFormat, LoggingConfig};

/// Install the global subscriber. Call once, at startup.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_current_span(true)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

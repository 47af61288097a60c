use std::str::FromStr;

use tracing::Level;

use promo_core::config::{LogFormat, LoggingConfig};

/// Install the global tracing subscriber from logging config. Safe to call
/// more than once; later calls are no-ops.
pub fn init_tracing(config: &LoggingConfig) {
    let level = Level::from_str(&config.level).unwrap_or(Level::INFO);
    let result = match config.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(level)
            .compact()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(level)
            .pretty()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(level)
            .json()
            .try_init(),
    };
    // Another subscriber already installed; keep it.
    let _ = result;
}

//! Structured logging initialisation.
//!
//! Installs a `tracing-subscriber` fmt subscriber filtered by `RUST_LOG` when
//! set, otherwise by the configured level.  Embedding applications that
//! install their own subscriber simply skip this.

use tracing_subscriber::EnvFilter;

use super::storage::config::LoggingConfig;

/// Installs the global subscriber.
///
/// Returns `false` if a global subscriber was already installed; the existing
/// one is kept.
pub fn init_logging(config: &LoggingConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(config))
        .try_init()
        .is_ok()
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

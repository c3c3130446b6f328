//! Tracing subscriber bootstrap shared by the binaries.

use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

use crate::config::LoggingConfig;

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over the configured filter when it is set.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let json = config.json.then(|| fmt::layer().json());
    let plain = (!config.json).then(fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .try_init()
}

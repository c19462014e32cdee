//! Structured log output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{EnvConfig, DEFAULT_LOG_FILTER};

/// Install the global stderr subscriber.
///
/// Returns `false` when a subscriber is already installed; the existing one
/// is left in place.
pub fn init(config: &EnvConfig) -> bool {
    let filter = EnvFilter::try_new(config.log_directive())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init()
        .is_ok()
}

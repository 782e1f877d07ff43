//! Logging initialisation
//!
//! Installs a `tracing-subscriber` fmt subscriber filtered by `RUST_LOG`,
//! falling back to the configured directive when the variable is unset or
//! unparsable. Libraries never call this; applications and test suites do.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber.
///
/// Idempotent: returns `true` if this call installed it, `false` if a
/// global subscriber was already set (by an earlier call or by the host
/// application).
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// [`init`] with the default logging settings, writing to the test harness
/// capture buffer.
pub fn init_for_tests() -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(LoggingConfig::default().filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        // Whichever call runs first in this process wins.
        init(&LoggingConfig::default());
        assert!(!init(&LoggingConfig::default()));
        assert!(!init_for_tests());
    }
}

//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

pub use tracing_subscriber::util::TryInitError;

/// Builds the filter: `RUST_LOG` wins, otherwise the configured directive.
#[must_use]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TryInitError> {
    let json = config.json.then(|| fmt::layer().json().with_current_span(true));
    let text = (!config.json).then(fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(json)
        .with(text)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_falls_back_to_config() {
        temp_env::with_var_unset("RUST_LOG", || {
            let config = LoggingConfig {
                filter: "tally=debug".to_string(),
                json: false,
            };
            assert_eq!(env_filter(&config).to_string(), "tally=debug");
        });
    }

    #[test]
    fn test_second_init_is_rejected() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}

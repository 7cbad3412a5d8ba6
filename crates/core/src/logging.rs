use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::CoreError;

/// Console logging setup for binaries embedding the tracker. Output goes to stderr.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `portfolio_history_core=debug`
    pub log_level: String,
    /// Emit one JSON object per line instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Level from `RUST_LOG`, falling back to `info`.
    pub fn from_env() -> Self {
        Self {
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            ..Self::default()
        }
    }
}

/// Install the global subscriber. Fails if the filter is malformed or a
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), CoreError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| CoreError::Config(format!("Invalid log filter '{}': {e}", config.log_level)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    result.map_err(|e| CoreError::Config(format!("Failed to install logger: {e}")))
}

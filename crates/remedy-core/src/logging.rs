//! Tracing subscriber setup

use remedy_config::{LogFormat, LogSettings};
use tracing_subscriber::EnvFilter;

/// Subscriber installation failed
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// `LOG_LEVEL` is not a valid filter directive
    #[error("invalid log filter {filter:?}: {message}")]
    InvalidFilter { filter: String, message: String },

    /// A global subscriber is already set
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Install the global fmt subscriber
///
/// `RUST_LOG` wins over `settings.level` when set. Calling this twice is an
/// error rather than a panic, so tests can call it freely.
///
/// # Errors
/// [`LoggingError::InvalidFilter`] for an unparsable level,
/// [`LoggingError::Install`] when a subscriber is already installed.
pub fn init_tracing(settings: &LogSettings) -> Result<(), LoggingError> {
    let filter = build_filter(settings)?;
    let result = match settings.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };
    result.map_err(|e| LoggingError::Install(e.to_string()))
}

fn build_filter(settings: &LogSettings) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.level).map_err(|e| LoggingError::InvalidFilter {
        filter: settings.level.clone(),
        message: e.to_string(),
    })
}

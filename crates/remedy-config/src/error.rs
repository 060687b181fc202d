//! Configuration errors

use std::path::PathBuf;

/// Errors raised while building a [`crate::Settings`] snapshot
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The source file exists but could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A line in the source file is not a valid `KEY=value` pair
    #[error("malformed config file {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// A key carries a value of the wrong shape
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    /// The assembled snapshot failed validation
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

//! Safety engine errors

use std::path::PathBuf;

/// Errors raised by the safety engine
#[derive(Debug, thiserror::Error)]
pub enum SafetyError {
    /// Target file could not be read for hashing or validation
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Task metadata does not describe a usable remediation plan
    #[error("invalid remediation plan: {0}")]
    InvalidPlan(String),

    /// A custom validator pattern failed to compile
    #[error("invalid validator pattern {name}: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },
}

impl SafetyError {
    pub(crate) fn unreadable(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.to_path_buf(),
            source,
        }
    }
}

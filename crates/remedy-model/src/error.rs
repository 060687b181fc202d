//! Error types for the task model

use crate::task::TaskStatus;

/// Model-level errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Status change outside the monotonic lifecycle
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition { from: TaskStatus, to: TaskStatus },

    /// Submission is missing required fields
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    /// Value could not be parsed into a model enum
    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_transition_display() {
        let err = ModelError::IllegalTransition {
            from: TaskStatus::Completed,
            to: TaskStatus::Pending,
        };
        assert_eq!(err.to_string(), "illegal status transition: completed -> pending");
    }
}

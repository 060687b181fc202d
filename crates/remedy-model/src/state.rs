//! Task lifecycle transitions
//!
//! `pending -> in_progress -> {completed | failed | needs_clarification}`

use crate::error::ModelError;
use crate::task::TaskStatus;

/// Validates a task status transition.
///
/// The lifecycle is monotonic: once a task leaves `Pending` it never comes
/// back, and terminal statuses have no outgoing edges.
pub fn validate_transition(from: TaskStatus, to: TaskStatus) -> Result<(), ModelError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(ModelError::IllegalTransition { from, to })
    }
}

#[must_use]
pub fn allowed_transitions(from: TaskStatus) -> Vec<TaskStatus> {
    match from {
        TaskStatus::Pending => vec![TaskStatus::InProgress],
        TaskStatus::InProgress => vec![
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::NeedsClarification,
        ],
        TaskStatus::Completed | TaskStatus::Failed | TaskStatus::NeedsClarification => vec![],
    }
}

fn allowed(from: TaskStatus, to: TaskStatus) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TaskStatus; 5] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Failed,
        TaskStatus::NeedsClarification,
    ];

    #[test]
    fn pending_only_starts() {
        assert!(validate_transition(TaskStatus::Pending, TaskStatus::InProgress).is_ok());
        assert!(validate_transition(TaskStatus::Pending, TaskStatus::Completed).is_err());
        assert!(validate_transition(TaskStatus::Pending, TaskStatus::Failed).is_err());
    }

    #[test]
    fn in_progress_reaches_every_terminal() {
        for to in [
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::NeedsClarification,
        ] {
            assert!(validate_transition(TaskStatus::InProgress, to).is_ok());
        }
    }

    #[test]
    fn nothing_reenters_pending() {
        for from in ALL {
            assert!(validate_transition(from, TaskStatus::Pending).is_err());
        }
    }

    #[test]
    fn terminals_are_sinks() {
        for from in ALL.into_iter().filter(TaskStatus::is_terminal) {
            assert!(allowed_transitions(from).is_empty());
        }
    }
}

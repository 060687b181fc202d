//! Orchestrator errors
//!
//! Two layers:
//! - [`PipelineError`]: misuse of the orchestrator itself (unknown task,
//!   task already run). Returned as `Err`.
//! - [`TaskFailure`]: a task that ran and failed. Never returned as `Err`;
//!   it becomes a failed [`remedy_model::TaskResult`].

use remedy_model::{FailureKind, ModelError, TaskId, TaskStatus};
use remedy_rollback::RollbackError;
use remedy_safety::SafetyError;
use std::io;

/// Errors in driving the pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No task with this id was submitted
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),

    /// A task with this id already exists
    #[error("duplicate task id: {0}")]
    DuplicateTask(TaskId),

    /// Only pending tasks can be executed
    #[error("task {id} is {status}, not pending")]
    NotPending { id: TaskId, status: TaskStatus },

    /// A result was already recorded for this task
    #[error("result already recorded for task {0}")]
    ResultAlreadyRecorded(TaskId),

    /// Invalid submission or illegal transition
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Why a task failed, before it is turned into a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TaskFailure {
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl From<SafetyError> for TaskFailure {
    fn from(err: SafetyError) -> Self {
        let kind = match &err {
            SafetyError::Unreadable { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                FailureKind::FileNotFound
            }
            SafetyError::Unreadable { .. } => FailureKind::Unreadable,
            SafetyError::InvalidPlan(_) | SafetyError::InvalidPattern { .. } => FailureKind::Internal,
        };
        Self::new(kind, err.to_string())
    }
}

impl From<RollbackError> for TaskFailure {
    fn from(err: RollbackError) -> Self {
        let kind = match &err {
            RollbackError::FileNotFound(_) => FailureKind::FileNotFound,
            RollbackError::NoBackupFound(_) => FailureKind::NoBackupFound,
            RollbackError::Io { .. } => FailureKind::Internal,
        };
        Self::new(kind, err.to_string())
    }
}

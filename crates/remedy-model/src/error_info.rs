//! Structured failure information carried on results and `system.error`

use crate::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Failure taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Target file changed since it was last inspected
    IntegrityDrift,
    /// Backup requested for a nonexistent file
    FileNotFound,
    /// Restore requested with no live backup
    NoBackupFound,
    /// A plugin hook failed (always recovered)
    PluginFailure,
    /// A plugin could not be loaded (always recovered)
    PluginLoadFailure,
    /// The external patch step reported failure
    PatchFailed,
    /// A post-patch validator rejected the result
    ValidationFailed,
    /// The patch step exceeded its time budget
    Timeout,
    /// The target file could not be read
    Unreadable,
    /// Pipeline bookkeeping failed
    Internal,
}

impl FailureKind {
    /// Whether this failure ends the task
    ///
    /// Plugin failures are observer problems and never change a task outcome.
    #[inline]
    #[must_use]
    pub fn is_fatal_to_task(&self) -> bool {
        !matches!(self, FailureKind::PluginFailure | FailureKind::PluginLoadFailure)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::IntegrityDrift => "integrity_drift",
            FailureKind::FileNotFound => "file_not_found",
            FailureKind::NoBackupFound => "no_backup_found",
            FailureKind::PluginFailure => "plugin_failure",
            FailureKind::PluginLoadFailure => "plugin_load_failure",
            FailureKind::PatchFailed => "patch_failed",
            FailureKind::ValidationFailed => "validation_failed",
            FailureKind::Timeout => "timeout",
            FailureKind::Unreadable => "unreadable",
            FailureKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Fixed points in the task lifecycle where plugin hooks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    BeforeTask,
    AfterTask,
    OnError,
}

impl HookPoint {
    /// Wire and label name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HookPoint::BeforeTask => "before_task",
            HookPoint::AfterTask => "after_task",
            HookPoint::OnError => "on_error",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error details attached to failed tasks and `system.error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    /// Failure classification
    pub kind: FailureKind,
    /// Human-readable message
    pub message: String,
    /// Task the failure belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    /// File involved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// When it happened
    pub occurred_at: DateTime<Utc>,
}

impl ErrorInfo {
    /// Create new error info stamped now
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            task_id: None,
            file: None,
            occurred_at: Utc::now(),
        }
    }

    /// With owning task
    #[inline]
    #[must_use]
    pub fn for_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// With file
    #[inline]
    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

//! Typed events and their fixed payload shapes
//!
//! Each [`EventKind`] has exactly one payload struct. Payloads reject unknown
//! fields so a producer drifting from the contract is caught when the event
//! is decoded with [`Event::from_wire`].

use crate::{EventError, EventKind};
use remedy_model::{ErrorInfo, FailureKind, HookPoint, Owner, Priority, TaskId, TaskType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `task.assigned`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskAssigned {
    pub task_id: TaskId,
    pub file: PathBuf,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub priority: Priority,
    pub assigned_to: Owner,
}

/// `task.started`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskStarted {
    pub task_id: TaskId,
    pub file: PathBuf,
}

/// `task.completed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskCompleted {
    pub task_id: TaskId,
    pub file: PathBuf,
    pub confidence_score: u8,
    pub requires_human_review: bool,
    /// Wall time in milliseconds
    pub execution_time: u64,
}

/// `task.failed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskFailed {
    pub task_id: TaskId,
    pub file: PathBuf,
    pub kind: FailureKind,
    pub message: String,
    /// Whether the file was restored from its backup
    pub rolled_back: bool,
}

/// `task.needs_clarification`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskNeedsClarification {
    pub task_id: TaskId,
    pub file: PathBuf,
    pub reason: String,
}

/// `system.error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SystemError {
    pub error: ErrorInfo,
}

/// `system.backup_created`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BackupCreated {
    pub file: PathBuf,
    pub backup_path: PathBuf,
}

/// `plugin.loaded`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PluginLoaded {
    pub name: String,
    pub version: String,
}

/// `plugin.error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PluginErrored {
    pub plugin: String,
    /// Hook that failed; absent for load failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<HookPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub message: String,
}

/// `executor.patch_applied`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PatchApplied {
    pub task_id: TaskId,
    pub file: PathBuf,
    pub success: bool,
}

/// `executor.rollback`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RolledBack {
    pub file: PathBuf,
    pub backup_path: PathBuf,
    pub reason: String,
}

/// A lifecycle event: one variant per [`EventKind`]
///
/// Wire form is `{"event": "<dotted name>", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum Event {
    #[serde(rename = "task.assigned")]
    TaskAssigned(TaskAssigned),
    #[serde(rename = "task.started")]
    TaskStarted(TaskStarted),
    #[serde(rename = "task.completed")]
    TaskCompleted(TaskCompleted),
    #[serde(rename = "task.failed")]
    TaskFailed(TaskFailed),
    #[serde(rename = "task.needs_clarification")]
    TaskNeedsClarification(TaskNeedsClarification),
    #[serde(rename = "system.error")]
    SystemError(SystemError),
    #[serde(rename = "system.backup_created")]
    BackupCreated(BackupCreated),
    #[serde(rename = "plugin.loaded")]
    PluginLoaded(PluginLoaded),
    #[serde(rename = "plugin.error")]
    PluginError(PluginErrored),
    #[serde(rename = "executor.patch_applied")]
    PatchApplied(PatchApplied),
    #[serde(rename = "executor.rollback")]
    Rollback(RolledBack),
}

impl Event {
    /// Which kind this event is
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Event::TaskAssigned(_) => EventKind::TaskAssigned,
            Event::TaskStarted(_) => EventKind::TaskStarted,
            Event::TaskCompleted(_) => EventKind::TaskCompleted,
            Event::TaskFailed(_) => EventKind::TaskFailed,
            Event::TaskNeedsClarification(_) => EventKind::TaskNeedsClarification,
            Event::SystemError(_) => EventKind::SystemError,
            Event::BackupCreated(_) => EventKind::BackupCreated,
            Event::PluginLoaded(_) => EventKind::PluginLoaded,
            Event::PluginError(_) => EventKind::PluginError,
            Event::PatchApplied(_) => EventKind::PatchApplied,
            Event::Rollback(_) => EventKind::Rollback,
        }
    }

    /// Decode an event from its name and an untyped payload
    ///
    /// # Errors
    /// [`EventError::UnknownEvent`] for a name outside the closed set,
    /// [`EventError::InvalidPayload`] when the payload does not match the
    /// shape fixed for that name.
    pub fn from_wire(name: &str, payload: serde_json::Value) -> Result<Self, EventError> {
        let kind: EventKind = name.parse()?;
        let invalid = |e: serde_json::Error| EventError::InvalidPayload {
            event: kind,
            message: e.to_string(),
        };
        let event = match kind {
            EventKind::TaskAssigned => {
                Event::TaskAssigned(serde_json::from_value(payload).map_err(invalid)?)
            }
            EventKind::TaskStarted => {
                Event::TaskStarted(serde_json::from_value(payload).map_err(invalid)?)
            }
            EventKind::TaskCompleted => {
                Event::TaskCompleted(serde_json::from_value(payload).map_err(invalid)?)
            }
            EventKind::TaskFailed => {
                Event::TaskFailed(serde_json::from_value(payload).map_err(invalid)?)
            }
            EventKind::TaskNeedsClarification => {
                Event::TaskNeedsClarification(serde_json::from_value(payload).map_err(invalid)?)
            }
            EventKind::SystemError => {
                Event::SystemError(serde_json::from_value(payload).map_err(invalid)?)
            }
            EventKind::BackupCreated => {
                Event::BackupCreated(serde_json::from_value(payload).map_err(invalid)?)
            }
            EventKind::PluginLoaded => {
                Event::PluginLoaded(serde_json::from_value(payload).map_err(invalid)?)
            }
            EventKind::PluginError => {
                Event::PluginError(serde_json::from_value(payload).map_err(invalid)?)
            }
            EventKind::PatchApplied => {
                Event::PatchApplied(serde_json::from_value(payload).map_err(invalid)?)
            }
            EventKind::Rollback => {
                Event::Rollback(serde_json::from_value(payload).map_err(invalid)?)
            }
        };
        Ok(event)
    }

    /// Encode to the `{"event", "payload"}` wire form
    #[must_use]
    pub fn to_wire(&self) -> serde_json::Value {
        // Payloads are plain structs of strings, numbers, and enums.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Task the event concerns, when it concerns one
    #[must_use]
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Event::TaskAssigned(p) => Some(&p.task_id),
            Event::TaskStarted(p) => Some(&p.task_id),
            Event::TaskCompleted(p) => Some(&p.task_id),
            Event::TaskFailed(p) => Some(&p.task_id),
            Event::TaskNeedsClarification(p) => Some(&p.task_id),
            Event::PatchApplied(p) => Some(&p.task_id),
            Event::SystemError(p) => p.error.task_id.as_ref(),
            Event::PluginError(p) => p.task_id.as_ref(),
            Event::BackupCreated(_) | Event::PluginLoaded(_) | Event::Rollback(_) => None,
        }
    }
}

//! The closed set of event names

use crate::EventError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every event the channel carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "task.assigned")]
    TaskAssigned,
    #[serde(rename = "task.started")]
    TaskStarted,
    #[serde(rename = "task.completed")]
    TaskCompleted,
    #[serde(rename = "task.failed")]
    TaskFailed,
    #[serde(rename = "task.needs_clarification")]
    TaskNeedsClarification,
    #[serde(rename = "system.error")]
    SystemError,
    #[serde(rename = "system.backup_created")]
    BackupCreated,
    #[serde(rename = "plugin.loaded")]
    PluginLoaded,
    #[serde(rename = "plugin.error")]
    PluginError,
    #[serde(rename = "executor.patch_applied")]
    PatchApplied,
    #[serde(rename = "executor.rollback")]
    Rollback,
}

impl EventKind {
    /// Every kind, in declaration order
    pub const ALL: [EventKind; 11] = [
        EventKind::TaskAssigned,
        EventKind::TaskStarted,
        EventKind::TaskCompleted,
        EventKind::TaskFailed,
        EventKind::TaskNeedsClarification,
        EventKind::SystemError,
        EventKind::BackupCreated,
        EventKind::PluginLoaded,
        EventKind::PluginError,
        EventKind::PatchApplied,
        EventKind::Rollback,
    ];

    /// Dotted wire name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::TaskAssigned => "task.assigned",
            EventKind::TaskStarted => "task.started",
            EventKind::TaskCompleted => "task.completed",
            EventKind::TaskFailed => "task.failed",
            EventKind::TaskNeedsClarification => "task.needs_clarification",
            EventKind::SystemError => "system.error",
            EventKind::BackupCreated => "system.backup_created",
            EventKind::PluginLoaded => "plugin.loaded",
            EventKind::PluginError => "plugin.error",
            EventKind::PatchApplied => "executor.patch_applied",
            EventKind::Rollback => "executor.rollback",
        }
    }
}

impl FromStr for EventKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| EventError::UnknownEvent(s.to_string()))
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

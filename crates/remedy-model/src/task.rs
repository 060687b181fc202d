//! Tasks and their lifecycle vocabulary
//!
//! A [`Task`] is one unit of remediation work targeting exactly one file.
//! Tasks are created by an external submitter (see [`TaskSubmission`]) and
//! mutated only by the orchestrating pipeline.

use crate::classification::{FixComplexity, ProblemClass};
use crate::error::ModelError;
use crate::state::validate_transition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use ulid::Ulid;

/// Well-known metadata keys read by the pipeline
pub mod keys {
    /// Problem classification (`syntax`, `logic`, `security`, ...)
    pub const ERROR_TYPE: &str = "errorType";
    /// Fix complexity tier (`simple`, `medium`, `complex`)
    pub const COMPLEXITY: &str = "complexity";
    /// Number of files the fix touches
    pub const FILES_AFFECTED: &str = "filesAffected";
}

/// Opaque task identifier
///
/// Submitters usually supply their own ids (`"T1"`, `"TASK-42"`); when they
/// don't, [`TaskId::generate`] produces a sortable ULID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create from any string
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh ULID-backed id
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of work a task asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Apply a remediation patch
    Fix,
    /// Review a change
    Review,
    /// Run or author tests
    Test,
    /// Deploy a change
    Deploy,
}

/// Task priority
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Which role owns the task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    #[default]
    Executor,
    Reviewer,
    Orchestrator,
}

/// Lifecycle status
///
/// Transitions are monotonic: `Pending → InProgress → {Completed | Failed |
/// NeedsClarification}`. See [`crate::state`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    NeedsClarification,
}

impl TaskStatus {
    /// Whether no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::NeedsClarification
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::NeedsClarification => "needs_clarification",
        };
        f.write_str(s)
    }
}

/// A unit of remediation work targeting exactly one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque identity
    pub id: TaskId,
    /// Kind of work
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Priority
    pub priority: Priority,
    /// Target file
    pub file: PathBuf,
    /// Proposed patch payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    /// Human-readable description
    pub description: String,
    /// Owning role
    pub assigned_to: Owner,
    /// Lifecycle status
    pub status: TaskStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
    /// Live pre-mutation backup, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
    /// Free-form metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Task {
    /// Create a pending task owned by the executor
    #[must_use]
    pub fn new(
        id: impl Into<TaskId>,
        task_type: TaskType,
        file: impl Into<PathBuf>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            task_type,
            priority: Priority::default(),
            file: file.into(),
            patch: None,
            description: description.into(),
            assigned_to: Owner::default(),
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            backup_path: None,
            metadata: BTreeMap::new(),
        }
    }

    /// With priority
    #[inline]
    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// With patch payload
    #[inline]
    #[must_use]
    pub fn with_patch(mut self, patch: impl Into<String>) -> Self {
        self.patch = Some(patch.into());
        self
    }

    /// With owner
    #[inline]
    #[must_use]
    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.assigned_to = owner;
        self
    }

    /// With a metadata entry
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Attach the classification inputs used for confidence scoring
    #[must_use]
    pub fn with_classification(
        self,
        class: ProblemClass,
        complexity: FixComplexity,
        files_affected: u32,
    ) -> Self {
        self.with_metadata(keys::ERROR_TYPE, class.as_str().into())
            .with_metadata(keys::COMPLEXITY, complexity.as_str().into())
            .with_metadata(keys::FILES_AFFECTED, files_affected.into())
    }

    /// Read a string metadata entry
    #[inline]
    #[must_use]
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(serde_json::Value::as_str)
    }

    /// Move to `to`, enforcing the monotonic lifecycle
    ///
    /// # Errors
    /// Returns [`ModelError::IllegalTransition`] when `to` is not reachable
    /// from the current status. The task is left untouched.
    pub fn transition(&mut self, to: TaskStatus) -> Result<(), ModelError> {
        validate_transition(self.status, to)?;
        self.status = to;
        self.touch();
        Ok(())
    }

    /// Bump `updated_at`
    #[inline]
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Inbound task-submission call
///
/// `{id, type, priority, file, patch?, description, assignedTo}`; missing
/// id, priority, and owner fall back to a generated id, `medium`, and
/// `executor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSubmission {
    #[serde(default)]
    pub id: Option<TaskId>,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub priority: Priority,
    pub file: PathBuf,
    #[serde(default)]
    pub patch: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_to: Owner,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl TaskSubmission {
    /// Minimal fix submission
    #[must_use]
    pub fn fix(file: impl Into<PathBuf>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            task_type: TaskType::Fix,
            priority: Priority::default(),
            file: file.into(),
            patch: None,
            description: description.into(),
            assigned_to: Owner::default(),
            metadata: BTreeMap::new(),
        }
    }

    /// With explicit id
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// With patch payload
    #[inline]
    #[must_use]
    pub fn with_patch(mut self, patch: impl Into<String>) -> Self {
        self.patch = Some(patch.into());
        self
    }

    /// With a metadata entry
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Check the submission is actionable
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidSubmission`] when the file is empty, or a
    /// fix carries neither a patch nor a description.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.file.as_os_str().is_empty() {
            return Err(ModelError::InvalidSubmission(
                "task file is required".to_string(),
            ));
        }
        if self.task_type == TaskType::Fix
            && self.patch.is_none()
            && self.description.trim().is_empty()
        {
            return Err(ModelError::InvalidSubmission(
                "fix tasks require either a patch or a description".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate and turn into a pending [`Task`]
    ///
    /// # Errors
    /// See [`TaskSubmission::validate`].
    pub fn into_task(self) -> Result<Task, ModelError> {
        self.validate()?;
        let id = self.id.unwrap_or_else(TaskId::generate);
        let mut task = Task::new(id, self.task_type, self.file, self.description)
            .with_priority(self.priority)
            .with_owner(self.assigned_to);
        task.patch = self.patch;
        task.metadata = self.metadata;
        Ok(task)
    }
}

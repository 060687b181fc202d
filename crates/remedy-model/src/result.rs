//! Task results, file changes, and execution metrics
//!
//! Exactly one [`TaskResult`] is produced per executed task, success or
//! failure.

use crate::classification::FixComplexity;
use crate::error_info::ErrorInfo;
use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    Created,
    Modified,
    Deleted,
}

/// One file touched by a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub file: PathBuf,
    pub action: FileAction,
    pub lines_changed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
}

impl FileChange {
    /// A modification of `file`
    #[must_use]
    pub fn modified(file: impl Into<PathBuf>, lines_changed: u32) -> Self {
        Self {
            file: file.into(),
            action: FileAction::Modified,
            lines_changed,
            backup_path: None,
        }
    }

    /// With the backup that preceded the change
    #[inline]
    #[must_use]
    pub fn with_backup(mut self, backup: impl Into<PathBuf>) -> Self {
        self.backup_path = Some(backup.into());
        self
    }
}

/// Execution metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetrics {
    /// Wall time in milliseconds
    pub execution_time: u64,
    pub lines_of_code: u32,
    pub complexity: FixComplexity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_coverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_score: Option<f64>,
}

impl Default for TaskMetrics {
    fn default() -> Self {
        Self {
            execution_time: 0,
            lines_of_code: 0,
            complexity: FixComplexity::Simple,
            test_coverage: None,
            security_score: None,
        }
    }
}

/// Outcome of one executed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub task_id: TaskId,
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub changes: Vec<FileChange>,
    #[serde(default)]
    pub metrics: TaskMetrics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// 0..=100
    pub confidence_score: u8,
    pub requires_human_review: bool,
}

impl TaskResult {
    /// Successful outcome
    #[must_use]
    pub fn success(
        task_id: TaskId,
        message: impl Into<String>,
        confidence_score: u8,
        requires_human_review: bool,
    ) -> Self {
        Self {
            task_id,
            success: true,
            message: message.into(),
            changes: Vec::new(),
            metrics: TaskMetrics::default(),
            errors: Vec::new(),
            warnings: Vec::new(),
            confidence_score: confidence_score.min(100),
            requires_human_review,
        }
    }

    /// Failed outcome
    ///
    /// Failures always carry zero confidence and are always flagged for a
    /// human.
    #[must_use]
    pub fn failure(task_id: TaskId, error: ErrorInfo) -> Self {
        Self {
            task_id,
            success: false,
            message: error.message.clone(),
            changes: Vec::new(),
            metrics: TaskMetrics::default(),
            errors: vec![error],
            warnings: Vec::new(),
            confidence_score: 0,
            requires_human_review: true,
        }
    }

    /// With a file change
    #[inline]
    #[must_use]
    pub fn with_change(mut self, change: FileChange) -> Self {
        self.changes.push(change);
        self
    }

    /// With metrics
    #[inline]
    #[must_use]
    pub fn with_metrics(mut self, metrics: TaskMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// With a warning
    #[inline]
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_info::FailureKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn success_wire_shape() {
        let result = TaskResult::success(TaskId::from("T1"), "applied", 95, false)
            .with_change(FileChange::modified("a.txt", 3).with_backup("a.txt.backup.1"));
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["taskId"], "T1");
        assert_eq!(json["success"], true);
        assert_eq!(json["confidenceScore"], 95);
        assert_eq!(json["requiresHumanReview"], false);
        assert_eq!(json["changes"][0]["action"], "modified");
        assert_eq!(json["changes"][0]["linesChanged"], 3);
        assert_eq!(json["changes"][0]["backupPath"], "a.txt.backup.1");
        assert_eq!(json["metrics"]["executionTime"], 0);
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn failure_is_zero_confidence_and_reviewed() {
        let err = ErrorInfo::new(FailureKind::PatchFailed, "patch rejected");
        let result = TaskResult::failure(TaskId::from("T2"), err);

        assert!(!result.success);
        assert_eq!(result.confidence_score, 0);
        assert!(result.requires_human_review);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.message, "patch rejected");
    }

    #[test]
    fn success_clamps_confidence() {
        let result = TaskResult::success(TaskId::from("T3"), "ok", 200, false);
        assert_eq!(result.confidence_score, 100);
    }
}

//! System health snapshot
//!
//! Score is the share of finished tasks that completed:
//!
//! ```text
//! score = round(completed / (completed + failed) * 100)   // 100 when nothing finished
//! ```
//!
//! `>= 90` is healthy, `>= 70` warning, anything lower critical. Tasks parked
//! for clarification count toward the totals but not toward the score.

use chrono::{DateTime, Utc};
use remedy_model::TaskResult;
use serde::Serialize;
use std::fmt;

/// Scores at or above this are healthy
pub const HEALTHY_THRESHOLD: u8 = 90;

/// Scores at or above this (and below healthy) are a warning
pub const WARNING_THRESHOLD: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    #[must_use]
    pub fn from_score(score: u8) -> Self {
        if score >= HEALTHY_THRESHOLD {
            HealthStatus::Healthy
        } else if score >= WARNING_THRESHOLD {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
        })
    }
}

/// Task totals by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
    pub needs_clarification: usize,
}

impl TaskCounts {
    /// Tasks that reached completed or failed
    #[must_use]
    pub fn finished(&self) -> usize {
        self.completed + self.failed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub score: u8,
    pub checked_at: DateTime<Utc>,
    pub counts: TaskCounts,
    /// failed / finished
    pub error_rate: f64,
    pub average_execution_ms: f64,
    pub average_confidence: f64,
}

impl SystemHealth {
    /// Derive a snapshot from status totals and recorded results
    #[must_use]
    pub fn compute(counts: TaskCounts, results: &[TaskResult]) -> Self {
        let finished = counts.finished();
        let score = if finished == 0 {
            100
        } else {
            percentage(counts.completed, finished)
        };

        #[allow(clippy::cast_precision_loss)]
        let (error_rate, average_execution_ms, average_confidence) = {
            let error_rate = counts.failed as f64 / finished.max(1) as f64;
            let n = results.len().max(1) as f64;
            let exec: u64 = results.iter().map(|r| r.metrics.execution_time).sum();
            let confidence: u64 = results.iter().map(|r| u64::from(r.confidence_score)).sum();
            (error_rate, exec as f64 / n, confidence as f64 / n)
        };

        Self {
            status: HealthStatus::from_score(score),
            score,
            checked_at: Utc::now(),
            counts,
            error_rate,
            average_execution_ms,
            average_confidence,
        }
    }
}

fn percentage(part: usize, whole: usize) -> u8 {
    // round half up without going through floats
    let pct = (part * 200 + whole) / (whole * 2);
    u8::try_from(pct.min(100)).unwrap_or(100)
}

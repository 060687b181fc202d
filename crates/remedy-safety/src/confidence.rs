//! Confidence scoring and the human-review gate
//!
//! ```text
//! score = 100 - class_penalty - complexity_penalty - min(files * 5, 30)
//! ```
//!
//! clamped to `0..=100`. A fix needs a human when the score is below
//! [`REVIEW_THRESHOLD`] or it touches more than [`MAX_UNREVIEWED_FILES`]
//! files.

use crate::SafetyError;
use remedy_model::task::keys;
use remedy_model::{FixComplexity, ProblemClass, Task};
use serde::{Deserialize, Serialize};

/// Scores strictly below this need review
pub const REVIEW_THRESHOLD: u8 = 70;

/// Fixes touching more files than this need review regardless of score
pub const MAX_UNREVIEWED_FILES: u32 = 3;

/// Ceiling on the files-affected penalty
pub const MAX_FILES_PENALTY: u32 = 30;

/// Penalty per problem classification
#[must_use]
pub const fn class_penalty(class: ProblemClass) -> u32 {
    match class {
        ProblemClass::Syntax => 5,
        ProblemClass::Logic => 15,
        ProblemClass::Security => 25,
        ProblemClass::Performance => 10,
        ProblemClass::Other => 20,
    }
}

/// Penalty per complexity tier
#[must_use]
pub const fn complexity_penalty(complexity: FixComplexity) -> u32 {
    match complexity {
        FixComplexity::Simple => 0,
        FixComplexity::Medium => 10,
        FixComplexity::Complex => 25,
    }
}

/// 5 per file, capped
#[must_use]
pub fn files_penalty(files_affected: u32) -> u32 {
    files_affected.saturating_mul(5).min(MAX_FILES_PENALTY)
}

/// Confidence that a fix can be applied unattended, `0..=100`
#[must_use]
pub fn calculate_confidence(class: ProblemClass, complexity: FixComplexity, files_affected: u32) -> u8 {
    let penalty = class_penalty(class) + complexity_penalty(complexity) + files_penalty(files_affected);
    let score = 100u32.saturating_sub(penalty).min(100);
    u8::try_from(score).unwrap_or(100)
}

/// Review gate: `score < 70 || files > 3`
#[inline]
#[must_use]
pub fn requires_human_review(score: u8, files_affected: u32) -> bool {
    score < REVIEW_THRESHOLD || files_affected > MAX_UNREVIEWED_FILES
}

/// Scoring inputs for one fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationPlan {
    pub error_type: ProblemClass,
    pub complexity: FixComplexity,
    pub files_affected: u32,
}

impl Default for RemediationPlan {
    fn default() -> Self {
        Self {
            error_type: ProblemClass::Other,
            complexity: FixComplexity::Simple,
            files_affected: 1,
        }
    }
}

impl RemediationPlan {
    #[must_use]
    pub fn new(error_type: ProblemClass, complexity: FixComplexity, files_affected: u32) -> Self {
        Self {
            error_type,
            complexity,
            files_affected,
        }
    }

    /// Read the plan from task metadata
    ///
    /// Missing keys default to `other`, `simple`, and `1`. An unknown
    /// classification scores as `other`.
    ///
    /// # Errors
    /// [`SafetyError::InvalidPlan`] for an unknown complexity tier or a
    /// files-affected value that is not a non-negative integer.
    pub fn from_task(task: &Task) -> Result<Self, SafetyError> {
        let mut plan = Self::default();
        if let Some(class) = task.metadata_str(keys::ERROR_TYPE) {
            plan.error_type = ProblemClass::parse_lenient(class);
        }
        if let Some(value) = task.metadata.get(keys::COMPLEXITY) {
            let raw = value
                .as_str()
                .ok_or_else(|| SafetyError::InvalidPlan(format!("complexity must be a string, got {value}")))?;
            plan.complexity = raw
                .parse()
                .map_err(|e: remedy_model::ModelError| SafetyError::InvalidPlan(e.to_string()))?;
        }
        if let Some(value) = task.metadata.get(keys::FILES_AFFECTED) {
            plan.files_affected = files_from_json(value).ok_or_else(|| {
                SafetyError::InvalidPlan(format!("filesAffected must be a non-negative integer, got {value}"))
            })?;
        }
        Ok(plan)
    }

    /// Score this plan
    #[must_use]
    pub fn assess(&self) -> Assessment {
        assess(self.error_type, self.complexity, self.files_affected)
    }
}

fn files_from_json(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Score plus the review decision derived from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub confidence_score: u8,
    pub requires_human_review: bool,
}

/// Score and gate in one call
#[must_use]
pub fn assess(class: ProblemClass, complexity: FixComplexity, files_affected: u32) -> Assessment {
    let confidence_score = calculate_confidence(class, complexity, files_affected);
    Assessment {
        confidence_score,
        requires_human_review: requires_human_review(confidence_score, files_affected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remedy_model::TaskType;
    use serde_json::json;

    #[test]
    fn simple_syntax_single_file() {
        // 100 - syntax(5) - simple(0) - 1 file(5)
        let a = assess(ProblemClass::Syntax, FixComplexity::Simple, 1);
        assert_eq!(a.confidence_score, 90);
        assert!(!a.requires_human_review);
    }

    #[test]
    fn complex_security_four_files() {
        // 100 - security(25) - complex(25) - 4 files(20)
        let a = assess(ProblemClass::Security, FixComplexity::Complex, 4);
        assert_eq!(a.confidence_score, 30);
        assert!(a.requires_human_review);
    }

    #[test]
    fn files_penalty_caps_at_thirty() {
        assert_eq!(files_penalty(0), 0);
        assert_eq!(files_penalty(6), 30);
        assert_eq!(files_penalty(u32::MAX), 30);
    }

    #[test]
    fn review_gate_boundaries() {
        assert!(!requires_human_review(70, 3));
        assert!(requires_human_review(69, 3));
        assert!(requires_human_review(100, 4));
    }

    #[test]
    fn plan_defaults_when_metadata_missing() {
        let task = Task::new("T1", TaskType::Fix, "a.txt", "fix");
        let plan = RemediationPlan::from_task(&task).unwrap();
        assert_eq!(plan, RemediationPlan::default());
        // other(20) + simple(0) + 1 file(5)
        assert_eq!(plan.assess().confidence_score, 75);
    }

    #[test]
    fn plan_reads_metadata() {
        let task = Task::new("T1", TaskType::Fix, "a.txt", "fix")
            .with_metadata(keys::ERROR_TYPE, json!("Logic"))
            .with_metadata(keys::COMPLEXITY, json!("medium"))
            .with_metadata(keys::FILES_AFFECTED, json!("2"));
        let plan = RemediationPlan::from_task(&task).unwrap();
        assert_eq!(plan, RemediationPlan::new(ProblemClass::Logic, FixComplexity::Medium, 2));
    }

    #[test]
    fn plan_rejects_bad_complexity_and_counts() {
        let bad_tier = Task::new("T1", TaskType::Fix, "a.txt", "fix")
            .with_metadata(keys::COMPLEXITY, json!("trivial"));
        assert!(matches!(
            RemediationPlan::from_task(&bad_tier),
            Err(SafetyError::InvalidPlan(_))
        ));

        let bad_count = Task::new("T1", TaskType::Fix, "a.txt", "fix")
            .with_metadata(keys::FILES_AFFECTED, json!(-1));
        assert!(RemediationPlan::from_task(&bad_count).is_err());
    }
}

//! Problem classification and fix complexity tiers
//!
//! Inputs to confidence scoring. Parsing is case-insensitive; an unrecognised
//! problem classification folds into [`ProblemClass::Other`] so tasks from
//! loose submitters still score (conservatively).

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classification of the problem a fix addresses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ProblemClass {
    Syntax,
    Logic,
    Security,
    Performance,
    #[default]
    Other,
}

impl ProblemClass {
    /// Every classification
    pub const ALL: [ProblemClass; 5] = [
        ProblemClass::Syntax,
        ProblemClass::Logic,
        ProblemClass::Security,
        ProblemClass::Performance,
        ProblemClass::Other,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProblemClass::Syntax => "syntax",
            ProblemClass::Logic => "logic",
            ProblemClass::Security => "security",
            ProblemClass::Performance => "performance",
            ProblemClass::Other => "other",
        }
    }

    /// Lenient parse: unknown labels become `Other`
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "syntax" => ProblemClass::Syntax,
            "logic" => ProblemClass::Logic,
            "security" => ProblemClass::Security,
            "performance" => ProblemClass::Performance,
            _ => ProblemClass::Other,
        }
    }
}

impl FromStr for ProblemClass {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl From<String> for ProblemClass {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

impl fmt::Display for ProblemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How involved a proposed fix is
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FixComplexity {
    #[default]
    Simple,
    Medium,
    Complex,
}

impl FixComplexity {
    /// Every tier
    pub const ALL: [FixComplexity; 3] = [
        FixComplexity::Simple,
        FixComplexity::Medium,
        FixComplexity::Complex,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            FixComplexity::Simple => "simple",
            FixComplexity::Medium => "medium",
            FixComplexity::Complex => "complex",
        }
    }

    /// Ordinal weight reported in task metrics
    #[inline]
    #[must_use]
    pub const fn weight(&self) -> u32 {
        match self {
            FixComplexity::Simple => 1,
            FixComplexity::Medium => 2,
            FixComplexity::Complex => 3,
        }
    }
}

impl FromStr for FixComplexity {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(FixComplexity::Simple),
            "medium" => Ok(FixComplexity::Medium),
            "complex" => Ok(FixComplexity::Complex),
            other => Err(ModelError::UnknownVariant {
                kind: "fix complexity",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for FixComplexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

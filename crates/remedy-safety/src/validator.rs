//! Post-patch validators
//!
//! Run against the file after the patch lands. Any finding fails the task
//! and triggers a rollback.

use crate::SafetyError;
use regex::Regex;
use serde::Serialize;
use std::path::Path;

/// A rule violation in a patched file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub validator: String,
    pub rule: String,
    /// 1-based
    pub line: usize,
    pub excerpt: String,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} at line {}: {}", self.validator, self.rule, self.line, self.excerpt)
    }
}

/// Inspects a file after a patch has been applied
pub trait PostValidator: Send + Sync {
    fn name(&self) -> &str;

    /// Findings for `content` (the file at `path`); empty when clean
    fn validate(&self, path: &Path, content: &str) -> Vec<Finding>;
}

/// Run every validator and concatenate findings
#[must_use]
pub fn run_validators<V>(validators: &[V], path: &Path, content: &str) -> Vec<Finding>
where
    V: AsRef<dyn PostValidator>,
{
    validators
        .iter()
        .flat_map(|v| v.as_ref().validate(path, content))
        .collect()
}

const BUILTIN_RULES: [(&str, &str); 5] = [
    ("eval", r"\beval\s*\("),
    ("inner-html", r"\.innerHTML\s*=(?:[^=]|$)"),
    ("document-write", r"\bdocument\.write\s*\("),
    ("hardcoded-password", r#"(?i)\bpassword\s*[:=]\s*["'][^"']+["']"#),
    ("hardcoded-api-key", r#"(?i)\bapi[_-]?key\s*[:=]\s*["'][^"']+["']"#),
];

/// Rejects well-known dangerous source patterns
#[derive(Debug, Clone)]
pub struct SecurityPatternValidator {
    rules: Vec<(String, Regex)>,
}

impl Default for SecurityPatternValidator {
    fn default() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .filter_map(|(name, pattern)| match Regex::new(pattern) {
                Ok(re) => Some(((*name).to_string(), re)),
                Err(err) => {
                    tracing::error!(rule = *name, error = %err, "built-in rule does not compile");
                    None
                }
            })
            .collect();
        Self { rules }
    }
}

impl SecurityPatternValidator {
    /// Validator with the built-in rules
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a custom rule
    ///
    /// # Errors
    /// [`SafetyError::InvalidPattern`] when `pattern` is not a valid regex.
    pub fn with_rule(mut self, name: impl Into<String>, pattern: &str) -> Result<Self, SafetyError> {
        let name = name.into();
        let re = Regex::new(pattern).map_err(|source| SafetyError::InvalidPattern {
            name: name.clone(),
            source,
        })?;
        self.rules.push((name, re));
        Ok(self)
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl PostValidator for SecurityPatternValidator {
    fn name(&self) -> &str {
        "security-patterns"
    }

    fn validate(&self, _path: &Path, content: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            for (rule, re) in &self.rules {
                if re.is_match(line) {
                    findings.push(Finding {
                        validator: self.name().to_string(),
                        rule: rule.clone(),
                        line: idx + 1,
                        excerpt: line.trim().chars().take(120).collect(),
                    });
                }
            }
        }
        findings
    }
}

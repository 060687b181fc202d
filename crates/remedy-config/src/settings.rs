//! Immutable settings snapshot

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Model endpoint settings
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSettings {
    pub name: String,
    /// Never serialized
    #[serde(skip)]
    pub api_key: String,
    pub timeout_ms: u64,
}

impl fmt::Debug for ModelSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("ModelSettings")
            .field("name", &self.name)
            .field("api_key", &key)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "default-model".to_string(),
            api_key: String::new(),
            timeout_ms: 30_000,
        }
    }
}

/// Filesystem locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSettings {
    pub repo_root: PathBuf,
    pub reports_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            repo_root: std::env::current_dir().unwrap_or_default(),
            reports_dir: PathBuf::from("reports"),
            backup_dir: PathBuf::from("backups"),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

/// Scheduler settings for the external trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerSettings {
    pub cron: String,
    pub timezone: String,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            cron: "*/5 * * * *".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `info` or `remedy_core=debug`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Pipeline execution knobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSettings {
    /// Upper bound on tasks in flight during batch execution
    pub max_concurrent_tasks: usize,
    /// Budget for a single patch application
    pub patch_timeout_ms: u64,
    /// Park review-required patches as `needs_clarification` instead of
    /// applying them
    pub hold_for_review: bool,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 3,
            patch_timeout_ms: 30_000,
            hold_for_review: false,
        }
    }
}

/// Complete settings snapshot
///
/// Built once by [`crate::ConfigLoader`] and never mutated; reloads replace
/// the whole snapshot through [`crate::ConfigHandle`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub model: ModelSettings,
    pub paths: PathSettings,
    pub scheduler: SchedulerSettings,
    pub logging: LogSettings,
    pub execution: ExecutionSettings,
}

impl Settings {
    /// Check the snapshot is usable
    ///
    /// # Errors
    /// Returns every problem found, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        if self.model.api_key.trim().is_empty() {
            problems.push("MODEL_API_KEY is required".to_string());
        }
        if self.paths.repo_root.as_os_str().is_empty() {
            problems.push("REPO_ROOT must not be empty".to_string());
        }
        let fields = self.scheduler.cron.split_whitespace().count();
        if fields != 5 {
            problems.push(format!(
                "SCHEDULER_CRON must have 5 fields, found {fields}"
            ));
        }
        if self.execution.max_concurrent_tasks == 0 {
            problems.push("MAX_CONCURRENT_TASKS must be at least 1".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Predicate form of [`Settings::validate`]
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

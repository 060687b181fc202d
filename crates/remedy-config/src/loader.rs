//! Flat key/value source to [`Settings`]
//!
//! Sources are `.env`-style files read through `dotenvy`'s iterator (the
//! process environment is never mutated), the process environment itself,
//! or any iterator of pairs. Unknown keys are ignored.

use crate::settings::{LogFormat, Settings};
use crate::ConfigError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Recognised keys
pub mod keys {
    pub const MODEL_NAME: &str = "MODEL_NAME";
    pub const MODEL_API_KEY: &str = "MODEL_API_KEY";
    pub const MODEL_TIMEOUT_MS: &str = "MODEL_TIMEOUT_MS";
    pub const REPO_ROOT: &str = "REPO_ROOT";
    pub const REPORTS_DIR: &str = "REPORTS_DIR";
    pub const BACKUP_DIR: &str = "BACKUP_DIR";
    pub const LOGS_DIR: &str = "LOGS_DIR";
    pub const SCHEDULER_CRON: &str = "SCHEDULER_CRON";
    pub const SCHEDULER_TIMEZONE: &str = "SCHEDULER_TIMEZONE";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
    pub const MAX_CONCURRENT_TASKS: &str = "MAX_CONCURRENT_TASKS";
    pub const PATCH_TIMEOUT_MS: &str = "PATCH_TIMEOUT_MS";
    pub const HOLD_FOR_REVIEW: &str = "HOLD_FOR_REVIEW";

    /// Every key the loader reads
    pub const ALL: [&str; 14] = [
        MODEL_NAME,
        MODEL_API_KEY,
        MODEL_TIMEOUT_MS,
        REPO_ROOT,
        REPORTS_DIR,
        BACKUP_DIR,
        LOGS_DIR,
        SCHEDULER_CRON,
        SCHEDULER_TIMEZONE,
        LOG_LEVEL,
        LOG_FORMAT,
        MAX_CONCURRENT_TASKS,
        PATCH_TIMEOUT_MS,
        HOLD_FOR_REVIEW,
    ];
}

/// Builds [`Settings`] snapshots
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Build from any iterator of `(key, value)` pairs
    ///
    /// Later pairs override earlier ones; absent keys take their defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for a malformed numeric,
    /// boolean, or format value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Settings, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        build(&map)
    }

    /// Build from a `.env`-style file
    ///
    /// A missing file yields all defaults.
    ///
    /// # Errors
    /// I/O failures other than not-found, malformed lines, and malformed
    /// values.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
        let pairs = read_file_pairs(path.as_ref())?;
        Self::from_pairs(pairs)
    }

    /// Build from the process environment
    ///
    /// # Errors
    /// Malformed values.
    pub fn from_env() -> Result<Settings, ConfigError> {
        Self::from_pairs(process_pairs())
    }

    /// File first, then the process environment on top
    ///
    /// Matches the usual `.env` convention: variables already exported in
    /// the environment win over the file.
    ///
    /// # Errors
    /// See [`ConfigLoader::from_env_file`].
    pub fn load(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
        let mut pairs = read_file_pairs(path.as_ref())?;
        pairs.extend(process_pairs());
        Self::from_pairs(pairs)
    }

    /// Like [`ConfigLoader::load`], then validate
    ///
    /// # Errors
    /// Loading errors, or [`ConfigError::Invalid`] listing every problem.
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
        let settings = Self::load(path)?;
        settings.validate().map_err(ConfigError::Invalid)?;
        Ok(settings)
    }
}

fn process_pairs() -> Vec<(String, String)> {
    std::env::vars()
        .filter(|(k, _)| keys::ALL.contains(&k.as_str()))
        .collect()
}

fn read_file_pairs(path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Vec::new());
    }
    let iter = dotenvy::from_path_iter(path).map_err(|e| file_error(path, e))?;
    let mut pairs = Vec::new();
    for item in iter {
        pairs.push(item.map_err(|e| file_error(path, e))?);
    }
    tracing::debug!(path = %path.display(), entries = pairs.len(), "config file read");
    Ok(pairs)
}

fn file_error(path: &Path, err: dotenvy::Error) -> ConfigError {
    match err {
        dotenvy::Error::Io(source) => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => ConfigError::Malformed {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    }
}

fn build(map: &HashMap<String, String>) -> Result<Settings, ConfigError> {
    let mut s = Settings::default();
    let get = |key: &str| map.get(key).map(String::as_str);

    if let Some(v) = get(keys::MODEL_NAME) {
        s.model.name = v.to_string();
    }
    if let Some(v) = get(keys::MODEL_API_KEY) {
        s.model.api_key = v.to_string();
    }
    if let Some(v) = get(keys::MODEL_TIMEOUT_MS) {
        s.model.timeout_ms = parse_number(keys::MODEL_TIMEOUT_MS, v)?;
    }
    if let Some(v) = get(keys::REPO_ROOT) {
        s.paths.repo_root = PathBuf::from(v);
    }
    if let Some(v) = get(keys::REPORTS_DIR) {
        s.paths.reports_dir = PathBuf::from(v);
    }
    if let Some(v) = get(keys::BACKUP_DIR) {
        s.paths.backup_dir = PathBuf::from(v);
    }
    if let Some(v) = get(keys::LOGS_DIR) {
        s.paths.logs_dir = PathBuf::from(v);
    }
    if let Some(v) = get(keys::SCHEDULER_CRON) {
        s.scheduler.cron = v.to_string();
    }
    if let Some(v) = get(keys::SCHEDULER_TIMEZONE) {
        s.scheduler.timezone = v.to_string();
    }
    if let Some(v) = get(keys::LOG_LEVEL) {
        s.logging.level = v.to_string();
    }
    if let Some(v) = get(keys::LOG_FORMAT) {
        s.logging.format = parse_format(v)?;
    }
    if let Some(v) = get(keys::MAX_CONCURRENT_TASKS) {
        s.execution.max_concurrent_tasks = parse_number(keys::MAX_CONCURRENT_TASKS, v)?;
    }
    if let Some(v) = get(keys::PATCH_TIMEOUT_MS) {
        s.execution.patch_timeout_ms = parse_number(keys::PATCH_TIMEOUT_MS, v)?;
    }
    if let Some(v) = get(keys::HOLD_FOR_REVIEW) {
        s.execution.hold_for_review = parse_bool(keys::HOLD_FOR_REVIEW, v)?;
    }
    Ok(s)
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: "expected a non-negative integer",
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected a boolean",
        }),
    }
}

fn parse_format(value: &str) -> Result<LogFormat, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "text" | "pretty" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        _ => Err(ConfigError::InvalidValue {
            key: keys::LOG_FORMAT,
            value: value.to_string(),
            reason: "expected `text` or `json`",
        }),
    }
}

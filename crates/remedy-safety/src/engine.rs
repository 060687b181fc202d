//! Pre-execution integrity tracking

use crate::{ContentHash, SafetyError};
use dashmap::DashMap;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of a pre-execution integrity check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum IntegrityVerdict {
    /// Safe to proceed; `first_seen` when this check stored the baseline
    Safe { hash: ContentHash, first_seen: bool },
    /// Content changed since the baseline was stored
    Drifted {
        expected: ContentHash,
        actual: ContentHash,
    },
}

impl IntegrityVerdict {
    #[inline]
    #[must_use]
    pub fn is_safe(&self) -> bool {
        matches!(self, IntegrityVerdict::Safe { .. })
    }
}

/// Path-keyed store of last-known content hashes
///
/// A baseline is stored the first time a path is seen, then refreshed by
/// [`SafetyEngine::update_hash`] after each successful write the pipeline
/// makes itself. Any other change shows up as drift.
///
/// Callers that snapshot a file when work is accepted use
/// [`SafetyEngine::baseline`] then, and [`SafetyEngine::verify_since`] right
/// before writing.
#[derive(Debug, Default)]
pub struct SafetyEngine {
    hashes: DashMap<PathBuf, ContentHash>,
}

impl SafetyEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the file against its stored baseline
    ///
    /// # Errors
    /// [`SafetyError::Unreadable`] if the file cannot be read.
    pub fn pre_execution_check(&self, path: &Path) -> Result<IntegrityVerdict, SafetyError> {
        let actual = ContentHash::of_file(path).map_err(|e| SafetyError::unreadable(path, e))?;
        let verdict = match self.hashes.entry(path.to_path_buf()) {
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(actual);
                IntegrityVerdict::Safe {
                    hash: actual,
                    first_seen: true,
                }
            }
            dashmap::mapref::entry::Entry::Occupied(slot) => {
                let expected = *slot.get();
                if expected == actual {
                    IntegrityVerdict::Safe {
                        hash: actual,
                        first_seen: false,
                    }
                } else {
                    IntegrityVerdict::Drifted { expected, actual }
                }
            }
        };
        report(path, &verdict);
        Ok(verdict)
    }

    /// Hash `path` when work against it is accepted
    ///
    /// The hash also becomes the path's baseline if it has none yet; an
    /// existing baseline is left alone.
    ///
    /// # Errors
    /// [`SafetyError::Unreadable`] if the file cannot be read.
    pub fn baseline(&self, path: &Path) -> Result<ContentHash, SafetyError> {
        let hash = ContentHash::of_file(path).map_err(|e| SafetyError::unreadable(path, e))?;
        self.hashes.entry(path.to_path_buf()).or_insert(hash);
        tracing::debug!(path = %path.display(), hash = %hash.short(), "submission snapshot taken");
        Ok(hash)
    }

    /// Compare the file against the snapshot taken at acceptance
    ///
    /// Safe when the content still matches `snapshot`, or matches the
    /// stored baseline left by the pipeline's own last write. Anything else
    /// was written by someone else after the snapshot.
    ///
    /// # Errors
    /// [`SafetyError::Unreadable`] if the file cannot be read.
    pub fn verify_since(
        &self,
        path: &Path,
        snapshot: ContentHash,
    ) -> Result<IntegrityVerdict, SafetyError> {
        let actual = ContentHash::of_file(path).map_err(|e| SafetyError::unreadable(path, e))?;
        let verdict = if actual == snapshot || self.stored_hash(path) == Some(actual) {
            IntegrityVerdict::Safe {
                hash: actual,
                first_seen: false,
            }
        } else {
            IntegrityVerdict::Drifted {
                expected: snapshot,
                actual,
            }
        };
        report(path, &verdict);
        Ok(verdict)
    }

    /// Recompute and store the baseline for `path`
    ///
    /// # Errors
    /// [`SafetyError::Unreadable`] if the file cannot be read.
    pub fn update_hash(&self, path: &Path) -> Result<ContentHash, SafetyError> {
        let hash = ContentHash::of_file(path).map_err(|e| SafetyError::unreadable(path, e))?;
        self.hashes.insert(path.to_path_buf(), hash);
        tracing::debug!(path = %path.display(), hash = %hash.short(), "baseline updated");
        Ok(hash)
    }

    /// Drop the baseline, returning it
    pub fn forget(&self, path: &Path) -> Option<ContentHash> {
        self.hashes.remove(path).map(|(_, h)| h)
    }

    #[must_use]
    pub fn stored_hash(&self, path: &Path) -> Option<ContentHash> {
        self.hashes.get(path).map(|h| *h)
    }

    /// Number of tracked paths
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.hashes.len()
    }
}

fn report(path: &Path, verdict: &IntegrityVerdict) {
    match verdict {
        IntegrityVerdict::Safe { hash, first_seen } => {
            tracing::debug!(path = %path.display(), hash = %hash.short(), first_seen, "integrity check passed");
        }
        IntegrityVerdict::Drifted { expected, actual } => {
            tracing::warn!(
                path = %path.display(),
                expected = %expected.short(),
                actual = %actual.short(),
                "integrity drift detected"
            );
            metrics::counter!("remedy_integrity_drift_total").increment(1);
        }
    }
}

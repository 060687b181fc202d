//! Rollback errors

use std::path::PathBuf;

/// Errors raised by the rollback manager
#[derive(Debug, thiserror::Error)]
pub enum RollbackError {
    /// Backup requested for a file that does not exist
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// Restore requested with no live backup on record or on disk
    #[error("no backup found for {0}")]
    NoBackupFound(PathBuf),

    /// Filesystem failure while copying or deleting
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RollbackError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

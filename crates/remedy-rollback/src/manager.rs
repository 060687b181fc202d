//! Backup registry and restore

use crate::RollbackError;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use remedy_events::event::{BackupCreated, RolledBack};
use remedy_events::{Event, EventBus};
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

const BACKUP_INFIX: &str = ".backup.";

/// The live backup for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    pub backup_path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Rollback status for one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackInfo {
    pub file: PathBuf,
    pub can_rollback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Milliseconds since the backup was taken
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Snapshots files before mutation and restores them on failure
///
/// Backups sit next to the original as `<path>.backup.<unix-millis>`. The
/// registry keeps at most one live backup per path; taking a new one moves
/// the pointer and leaves the older copy on disk for
/// [`RollbackManager::collect_garbage`].
#[derive(Debug)]
pub struct RollbackManager {
    bus: EventBus,
    registry: DashMap<PathBuf, BackupRecord>,
}

impl RollbackManager {
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            registry: DashMap::new(),
        }
    }

    /// Copy `path` to a fresh backup and make it the live one
    ///
    /// Emits `system.backup_created`.
    ///
    /// # Errors
    /// [`RollbackError::FileNotFound`] when `path` is not an existing file,
    /// [`RollbackError::Io`] when the copy fails.
    pub fn create_backup(&self, path: &Path) -> Result<PathBuf, RollbackError> {
        if !path.is_file() {
            return Err(RollbackError::FileNotFound(path.to_path_buf()));
        }
        let (backup_path, dest) = reserve_backup_path(path)?;
        let size_bytes = fill_backup(path, &backup_path, dest)?;

        let record = BackupRecord {
            backup_path: backup_path.clone(),
            created_at: Utc::now(),
            size_bytes,
        };
        if let Some(previous) = self.registry.insert(path.to_path_buf(), record) {
            tracing::debug!(
                path = %path.display(),
                previous = %previous.backup_path.display(),
                "live backup superseded"
            );
        }

        tracing::info!(path = %path.display(), backup = %backup_path.display(), size_bytes, "backup created");
        metrics::counter!("remedy_backups_created_total").increment(1);
        self.bus.publish(Event::BackupCreated(BackupCreated {
            file: path.to_path_buf(),
            backup_path: backup_path.clone(),
        }));
        Ok(backup_path)
    }

    /// Overwrite `path` with its live backup, then discard the backup
    ///
    /// Emits `executor.rollback` with `reason`. Returns the backup used.
    ///
    /// # Errors
    /// [`RollbackError::NoBackupFound`] when no live backup is registered or
    /// the registered copy has vanished (the dangling entry is dropped).
    /// [`RollbackError::Io`] when the copy back fails; the entry is kept so
    /// the restore can be retried.
    pub fn restore_on_failure(&self, path: &Path, reason: &str) -> Result<PathBuf, RollbackError> {
        let record = self
            .registry
            .get(path)
            .map(|r| r.clone())
            .ok_or_else(|| RollbackError::NoBackupFound(path.to_path_buf()))?;

        if !record.backup_path.is_file() {
            self.registry.remove(path);
            tracing::warn!(
                path = %path.display(),
                backup = %record.backup_path.display(),
                "registered backup is missing on disk"
            );
            return Err(RollbackError::NoBackupFound(path.to_path_buf()));
        }

        fs::copy(&record.backup_path, path).map_err(|e| RollbackError::io(path, e))?;

        tracing::warn!(path = %path.display(), backup = %record.backup_path.display(), reason, "file restored from backup");
        metrics::counter!("remedy_rollbacks_total").increment(1);
        self.bus.publish(Event::Rollback(RolledBack {
            file: path.to_path_buf(),
            backup_path: record.backup_path.clone(),
            reason: reason.to_string(),
        }));

        self.registry.remove(path);
        remove_quietly(&record.backup_path);
        Ok(record.backup_path)
    }

    /// Discard the live backup after a successful change
    ///
    /// Returns whether there was one.
    ///
    /// # Errors
    /// [`RollbackError::Io`] when the backup exists but cannot be deleted.
    pub fn cleanup_backup(&self, path: &Path) -> Result<bool, RollbackError> {
        let Some((_, record)) = self.registry.remove(path) else {
            return Ok(false);
        };
        match fs::remove_file(&record.backup_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(RollbackError::io(&record.backup_path, e)),
        }
        tracing::debug!(path = %path.display(), backup = %record.backup_path.display(), "backup cleaned up");
        Ok(true)
    }

    #[must_use]
    pub fn has_backup(&self, path: &Path) -> bool {
        self.registry.contains_key(path)
    }

    #[must_use]
    pub fn get_backup_path(&self, path: &Path) -> Option<PathBuf> {
        self.registry.get(path).map(|r| r.backup_path.clone())
    }

    /// Number of paths with a live backup
    #[must_use]
    pub fn live_backups(&self) -> usize {
        self.registry.len()
    }

    /// Every `<path>.backup.<millis>` copy on disk, oldest first
    ///
    /// # Errors
    /// [`RollbackError::Io`] when the containing directory cannot be read.
    pub fn list_backups(&self, path: &Path) -> Result<Vec<PathBuf>, RollbackError> {
        let dir = parent_dir(path);
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(Vec::new());
        };
        let prefix = format!("{file_name}{BACKUP_INFIX}");

        let entries = fs::read_dir(&dir).map_err(|e| RollbackError::io(&dir, e))?;
        let mut found: Vec<(u64, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name();
                let stamp = name.to_str()?.strip_prefix(&prefix)?.parse::<u64>().ok()?;
                Some((stamp, entry.path()))
            })
            .collect();
        found.sort();
        Ok(found.into_iter().map(|(_, p)| p).collect())
    }

    /// Delete backup copies of `path` that are not the live backup
    ///
    /// Returns how many were removed.
    ///
    /// # Errors
    /// See [`RollbackManager::list_backups`].
    pub fn collect_garbage(&self, path: &Path) -> Result<usize, RollbackError> {
        let live = self.get_backup_path(path);
        let mut removed = 0;
        for candidate in self.list_backups(path)? {
            if live.as_deref().is_some_and(|l| same_file_name(l, &candidate)) {
                continue;
            }
            if fs::remove_file(&candidate).is_ok() {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(path = %path.display(), removed, "stale backups collected");
        }
        Ok(removed)
    }

    /// Rollback status for `path`
    #[must_use]
    pub fn rollback_info(&self, path: &Path) -> RollbackInfo {
        let record = self.registry.get(path).map(|r| r.clone());
        match record {
            Some(r) => RollbackInfo {
                file: path.to_path_buf(),
                can_rollback: r.backup_path.is_file(),
                age_ms: Some((Utc::now() - r.created_at).num_milliseconds()),
                created_at: Some(r.created_at),
                size_bytes: Some(r.size_bytes),
                backup_path: Some(r.backup_path),
            },
            None => RollbackInfo {
                file: path.to_path_buf(),
                can_rollback: false,
                backup_path: None,
                created_at: None,
                age_ms: None,
                size_bytes: None,
            },
        }
    }
}

/// Pick `<path>.backup.<millis>`, bumping the suffix until the name is free,
/// and create it exclusively.
fn reserve_backup_path(path: &Path) -> Result<(PathBuf, File), RollbackError> {
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let mut name = OsString::from(path.as_os_str());
        name.push(format!("{BACKUP_INFIX}{millis}"));
        let candidate = PathBuf::from(name);
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => millis += 1,
            Err(e) => return Err(RollbackError::io(&candidate, e)),
        }
    }
}

/// Copy `source` into the reserved backup file; the reservation is removed
/// if any step fails.
fn fill_backup(source: &Path, backup_path: &Path, mut dest: File) -> Result<u64, RollbackError> {
    let copied = File::open(source)
        .map_err(|e| RollbackError::io(source, e))
        .and_then(|mut src| {
            io::copy(&mut src, &mut dest).map_err(|e| RollbackError::io(backup_path, e))
        })
        .and_then(|n| {
            dest.sync_all()
                .map(|()| n)
                .map_err(|e| RollbackError::io(backup_path, e))
        });
    if copied.is_err() {
        drop(dest);
        remove_quietly(backup_path);
    }
    copied
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn same_file_name(a: &Path, b: &Path) -> bool {
    a.file_name() == b.file_name()
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to delete backup");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use remedy_events::EventKind;
    use std::sync::Arc;

    fn setup() -> (tempfile::TempDir, PathBuf, RollbackManager) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "original").unwrap();
        (dir, path, RollbackManager::new(EventBus::new()))
    }

    #[test]
    fn backup_name_has_millis_suffix() {
        let (_dir, path, mgr) = setup();
        let backup = mgr.create_backup(&path).unwrap();

        let name = backup.file_name().unwrap().to_str().unwrap();
        let stamp = name.strip_prefix("a.txt.backup.").unwrap();
        assert!(stamp.parse::<u64>().is_ok());
        assert_eq!(fs::read_to_string(&backup).unwrap(), "original");
        assert!(mgr.has_backup(&path));
        assert_eq!(mgr.get_backup_path(&path), Some(backup));
    }

    #[test]
    fn failed_copy_removes_the_reservation() {
        let (dir, path, _mgr) = setup();
        let (reserved, dest) = reserve_backup_path(&path).unwrap();
        assert!(reserved.exists());

        let err = fill_backup(&dir.path().join("vanished.txt"), &reserved, dest).unwrap_err();
        assert!(matches!(err, RollbackError::Io { .. }));
        assert!(!reserved.exists());
        let stray: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().contains(".backup."))
            .collect();
        assert!(stray.is_empty());
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let (dir, _path, mgr) = setup();
        let err = mgr.create_backup(&dir.path().join("ghost.txt")).unwrap_err();
        assert!(matches!(err, RollbackError::FileNotFound(_)));
    }

    #[test]
    fn restore_then_second_restore_fails() {
        let (_dir, path, mgr) = setup();
        let backup = mgr.create_backup(&path).unwrap();
        fs::write(&path, "broken").unwrap();

        let used = mgr.restore_on_failure(&path, "patch failed").unwrap();
        assert_eq!(used, backup);
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert!(!backup.exists());
        assert!(!mgr.has_backup(&path));

        let err = mgr.restore_on_failure(&path, "again").unwrap_err();
        assert!(matches!(err, RollbackError::NoBackupFound(_)));
    }

    #[test]
    fn vanished_backup_drops_entry() {
        let (_dir, path, mgr) = setup();
        let backup = mgr.create_backup(&path).unwrap();
        fs::remove_file(&backup).unwrap();

        let err = mgr.restore_on_failure(&path, "x").unwrap_err();
        assert!(matches!(err, RollbackError::NoBackupFound(_)));
        assert!(!mgr.has_backup(&path));
    }

    #[test]
    fn same_millisecond_backups_get_distinct_names() {
        let (_dir, path, mgr) = setup();
        let first = mgr.create_backup(&path).unwrap();
        let second = mgr.create_backup(&path).unwrap();
        assert_ne!(first, second);
        assert!(first.exists());
        assert_eq!(mgr.get_backup_path(&path), Some(second));
    }

    #[test]
    fn cleanup_removes_live_backup() {
        let (_dir, path, mgr) = setup();
        let backup = mgr.create_backup(&path).unwrap();

        assert!(mgr.cleanup_backup(&path).unwrap());
        assert!(!backup.exists());
        assert!(!mgr.has_backup(&path));
        assert!(!mgr.cleanup_backup(&path).unwrap());
    }

    #[test]
    fn garbage_collection_keeps_live_backup() {
        let (_dir, path, mgr) = setup();
        mgr.create_backup(&path).unwrap();
        mgr.create_backup(&path).unwrap();
        let live = mgr.create_backup(&path).unwrap();
        assert_eq!(mgr.list_backups(&path).unwrap().len(), 3);

        assert_eq!(mgr.collect_garbage(&path).unwrap(), 2);
        assert_eq!(mgr.list_backups(&path).unwrap(), vec![live]);
    }

    #[test]
    fn list_ignores_unrelated_files() {
        let (dir, path, mgr) = setup();
        fs::write(dir.path().join("a.txt.backup.notes"), "x").unwrap();
        fs::write(dir.path().join("b.txt.backup.1"), "x").unwrap();
        assert!(mgr.list_backups(&path).unwrap().is_empty());
    }

    #[test]
    fn rollback_info_reports_live_backup() {
        let (_dir, path, mgr) = setup();
        assert!(!mgr.rollback_info(&path).can_rollback);

        let backup = mgr.create_backup(&path).unwrap();
        let info = mgr.rollback_info(&path);
        assert!(info.can_rollback);
        assert_eq!(info.backup_path, Some(backup));
        assert_eq!(info.size_bytes, Some(8));
        assert!(info.age_ms.unwrap() >= 0);
    }

    #[test]
    fn emits_backup_and_rollback_events() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in [EventKind::BackupCreated, EventKind::Rollback] {
            let seen = Arc::clone(&seen);
            bus.subscribe(kind, move |event| {
                seen.lock().push(event.clone());
                Ok(())
            });
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "original").unwrap();
        let mgr = RollbackManager::new(bus);

        let backup = mgr.create_backup(&path).unwrap();
        mgr.restore_on_failure(&path, "validator rejected").unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(matches!(&seen[0], Event::BackupCreated(p) if p.backup_path == backup));
        assert!(matches!(&seen[1], Event::Rollback(p) if p.reason == "validator rejected"));
    }
}

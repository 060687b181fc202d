//! Patch application seam
//!
//! The pipeline never edits files itself. It hands the target path and the
//! patch payload to a [`PatchApplier`] and awaits the outcome.

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// What a successful application changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedPatch {
    /// Lines that differ between the old and new content
    pub lines_changed: u32,
    /// Line count of the new content
    pub lines_of_code: u32,
}

/// Applies a patch payload to a file
#[async_trait]
pub trait PatchApplier: Send + Sync {
    /// Apply `patch` to `path`
    ///
    /// # Errors
    /// Any error fails the task and triggers a rollback.
    async fn apply(&self, path: &Path, patch: &str) -> anyhow::Result<AppliedPatch>;
}

/// Writes the patch payload as the complete new file content
///
/// The content is staged in a temporary sibling and renamed over the target.
/// Dropping the future (a timeout) before the rename leaves the target
/// untouched and the staged file is deleted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceContentApplier;

#[async_trait]
impl PatchApplier for ReplaceContentApplier {
    async fn apply(&self, path: &Path, patch: &str) -> anyhow::Result<AppliedPatch> {
        let before = tokio::fs::read(path)
            .await
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default();
        let staged = stage(path.to_path_buf(), patch.to_owned()).await?;
        // No await from here on: the rename happens in this poll or never
        staged.persist(path)?;
        tracing::debug!(path = %path.display(), bytes = patch.len(), "replaced file content");
        Ok(AppliedPatch {
            lines_changed: changed_lines(&before, patch),
            lines_of_code: saturate(patch.lines().count()),
        })
    }
}

/// Write `content` to a synced temp file next to `path`, keeping its mode
async fn stage(path: PathBuf, content: String) -> anyhow::Result<NamedTempFile> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<NamedTempFile> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut staged = tempfile::Builder::new()
            .prefix(".remedy-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        staged.write_all(content.as_bytes())?;
        if let Ok(meta) = std::fs::metadata(&path) {
            staged.as_file().set_permissions(meta.permissions())?;
        }
        staged.as_file().sync_all()?;
        Ok(staged)
    })
    .await?
}

/// Positional line diff: differing lines plus the length difference
#[must_use]
pub fn changed_lines(before: &str, after: &str) -> u32 {
    let old: Vec<&str> = before.lines().collect();
    let new: Vec<&str> = after.lines().collect();
    let differing = old.iter().zip(&new).filter(|(a, b)| a != b).count();
    saturate(differing + old.len().abs_diff(new.len()))
}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

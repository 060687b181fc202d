//! The plugin contract

use remedy_model::{ErrorInfo, Task, TaskResult};

/// A lifecycle observer
///
/// Every hook defaults to a no-op. Hooks may fail or even panic; the
/// manager contains the failure, reports it, and carries on, so a plugin can
/// never change a task's outcome.
pub trait Plugin: Send + Sync {
    /// Unique name within one manager
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// One-time setup with the plugin's configuration (`Null` when none)
    ///
    /// # Errors
    /// Any error leaves the plugin unloaded.
    fn init(&mut self, _config: &serde_json::Value) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs before the task touches its file
    ///
    /// # Errors
    /// Reported via `plugin.error`; the task proceeds regardless.
    fn before_task(&self, _task: &Task) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs once the task has a result, success or failure
    ///
    /// # Errors
    /// Reported via `plugin.error`.
    fn after_task(&self, _task: &Task, _result: &TaskResult) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after a task fails
    ///
    /// # Errors
    /// Reported via `plugin.error`.
    fn on_error(&self, _task: &Task, _error: &ErrorInfo) -> anyhow::Result<()> {
        Ok(())
    }
}

//! Built-in plugins

use crate::Plugin;
use remedy_model::{ErrorInfo, Task, TaskResult};

/// Logs every lifecycle point through `tracing`
#[derive(Debug, Clone, Default)]
pub struct TracingPlugin {
    verbose: bool,
}

impl TracingPlugin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin for TracingPlugin {
    fn name(&self) -> &str {
        "tracing"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    /// Accepts `{"verbose": true}` to include task descriptions.
    fn init(&mut self, config: &serde_json::Value) -> anyhow::Result<()> {
        match config.get("verbose") {
            None => {}
            Some(serde_json::Value::Bool(v)) => self.verbose = *v,
            Some(other) => anyhow::bail!("`verbose` must be a boolean, got {other}"),
        }
        Ok(())
    }

    fn before_task(&self, task: &Task) -> anyhow::Result<()> {
        if self.verbose {
            tracing::info!(task_id = %task.id, file = %task.file.display(), description = %task.description, "task starting");
        } else {
            tracing::info!(task_id = %task.id, file = %task.file.display(), "task starting");
        }
        Ok(())
    }

    fn after_task(&self, task: &Task, result: &TaskResult) -> anyhow::Result<()> {
        tracing::info!(
            task_id = %task.id,
            success = result.success,
            confidence = result.confidence_score,
            review = result.requires_human_review,
            "task finished"
        );
        Ok(())
    }

    fn on_error(&self, task: &Task, error: &ErrorInfo) -> anyhow::Result<()> {
        tracing::warn!(task_id = %task.id, kind = %error.kind, error = %error.message, "task failed");
        Ok(())
    }
}

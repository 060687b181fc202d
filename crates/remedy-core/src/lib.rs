//! Remedy Core - the remediation pipeline
//!
//! Drives a task from submission to exactly one result:
//! - Per-file locking so two tasks never edit the same file at once
//! - Confidence gating before anything is touched
//! - Integrity check, backup, patch, and post-validation
//! - Automatic rollback on failure
//! - Plugin hooks and lifecycle events throughout
//!
//! # Example
//!
//! ```rust,no_run
//! use remedy_config::Settings;
//! use remedy_core::Orchestrator;
//! use remedy_model::TaskSubmission;
//!
//! # async fn run() -> Result<(), remedy_core::PipelineError> {
//! let orchestrator = Orchestrator::builder(Settings::default()).build();
//! let id = orchestrator.submit(
//!     TaskSubmission::fix("src/app.js", "drop debug logging").with_patch("console.info('ready');\n"),
//! )?;
//! let result = orchestrator.execute(&id).await?;
//! println!("{} -> {}", id, result.confidence_score);
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]

pub mod applier;
pub mod error;
pub mod health;
pub mod locks;
pub mod logging;
pub mod orchestrator;
pub mod store;

pub use applier::{AppliedPatch, PatchApplier, ReplaceContentApplier};
pub use error::{PipelineError, TaskFailure};
pub use health::{HealthStatus, SystemHealth, TaskCounts};
pub use locks::{FileLockGuard, FileLocks};
pub use logging::{init_tracing, LoggingError};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use store::TaskStore;

/// Common imports for embedding the pipeline
pub mod prelude {
    pub use crate::{
        HealthStatus, Orchestrator, OrchestratorBuilder, PatchApplier, PipelineError,
        SystemHealth,
    };
    pub use remedy_config::{ConfigLoader, Settings};
    pub use remedy_events::{Event, EventBus, EventKind};
    pub use remedy_model::{Task, TaskId, TaskResult, TaskStatus, TaskSubmission};
    pub use remedy_plugin::{Plugin, PluginManager};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Remedy Model - shared remediation vocabulary
//!
//! Inert data containers every other component reads and writes:
//! - Tasks and their lifecycle status
//! - Results, file changes, and execution metrics
//! - Problem classification and fix complexity tiers
//! - Structured error information for failure reporting
//!
//! Field names serialize in camelCase and enum values in snake_case so the
//! wire shapes stay interoperable with other submitters and dashboards.
//!
//! # Example
//!
//! ```rust
//! use remedy_model::{Task, TaskStatus, TaskType};
//!
//! let mut task = Task::new("T1", TaskType::Fix, "a.txt", "remove stray debug output");
//! task.transition(TaskStatus::InProgress).unwrap();
//! assert_eq!(task.status, TaskStatus::InProgress);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod classification;
pub mod error;
pub mod error_info;
pub mod result;
pub mod state;
pub mod task;

pub use classification::{FixComplexity, ProblemClass};
pub use error::ModelError;
pub use error_info::{ErrorInfo, FailureKind, HookPoint};
pub use result::{FileAction, FileChange, TaskMetrics, TaskResult};
pub use state::{allowed_transitions, validate_transition};
pub use task::{Owner, Priority, Task, TaskId, TaskStatus, TaskSubmission, TaskType};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

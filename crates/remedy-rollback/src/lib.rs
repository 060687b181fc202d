//! Remedy Rollback - guaranteed backup before every write
//!
//! [`RollbackManager`] copies a file aside before the pipeline touches it,
//! restores it when anything downstream fails, and discards the copy once a
//! change is accepted.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod manager;

pub use error::RollbackError;
pub use manager::{BackupRecord, RollbackInfo, RollbackManager};

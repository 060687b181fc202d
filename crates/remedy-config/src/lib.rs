//! Remedy Config - flat key/value configuration
//!
//! Turns a `.env`-style file, the process environment, or any pair iterator
//! into an immutable, nested [`Settings`] snapshot. [`ConfigHandle`] shares
//! the snapshot across components and swaps it wholesale on reload.
//!
//! # Example
//!
//! ```rust
//! use remedy_config::ConfigLoader;
//!
//! let settings = ConfigLoader::from_pairs([("MODEL_API_KEY", "k"), ("REPO_ROOT", "/repo")])
//!     .unwrap();
//! assert!(settings.is_valid());
//! assert_eq!(settings.execution.max_concurrent_tasks, 3);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod handle;
pub mod loader;
pub mod settings;

pub use error::ConfigError;
pub use handle::ConfigHandle;
pub use loader::{keys, ConfigLoader};
pub use settings::{
    ExecutionSettings, LogFormat, LogSettings, ModelSettings, PathSettings, SchedulerSettings,
    Settings,
};

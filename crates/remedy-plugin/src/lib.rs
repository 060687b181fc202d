//! Remedy Plugin - lifecycle hooks that can never break a task
//!
//! Plugins are listed explicitly on a [`PluginManagerBuilder`] and loaded
//! in order. Hooks run at three points (before a task, after it, and on
//! failure). Whatever a hook does, including panicking, is captured in a
//! [`HookReport`] and announced as `plugin.error`; the task carries on.
//!
//! # Example
//!
//! ```rust
//! use remedy_events::EventBus;
//! use remedy_plugin::{PluginManager, TracingPlugin};
//!
//! let (plugins, report) = PluginManager::builder(EventBus::new())
//!     .register(TracingPlugin::new())
//!     .build();
//! assert!(report.is_clean());
//! assert_eq!(plugins.plugins()[0].name, "tracing");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod builtin;
pub mod error;
pub mod manager;
pub mod plugin;

pub use builtin::TracingPlugin;
pub use error::PluginError;
pub use manager::{
    HookOutcome, HookReport, HookStatus, LoadReport, PluginInfo, PluginManager,
    PluginManagerBuilder,
};
pub use plugin::Plugin;

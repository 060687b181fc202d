//! Shared, reloadable settings handle

use crate::{ConfigError, ConfigLoader, Settings};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

/// Cheaply cloneable handle to the current [`Settings`] snapshot
///
/// Readers get an `Arc<Settings>` that stays consistent for as long as they
/// hold it; a reload swaps the whole snapshot and never mutates one in place.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    current: Arc<RwLock<Arc<Settings>>>,
}

impl ConfigHandle {
    /// Wrap an initial snapshot
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    /// Current snapshot
    #[must_use]
    pub fn current(&self) -> Arc<Settings> {
        Arc::clone(&self.current.read())
    }

    /// Replace the snapshot, returning the previous one
    pub fn replace(&self, settings: Settings) -> Arc<Settings> {
        let next = Arc::new(settings);
        std::mem::replace(&mut *self.current.write(), next)
    }

    /// Reload from a `.env`-style file and swap it in
    ///
    /// The old snapshot stays in place when loading fails.
    ///
    /// # Errors
    /// See [`ConfigLoader::from_env_file`].
    pub fn reload_from(&self, path: impl AsRef<Path>) -> Result<Arc<Settings>, ConfigError> {
        let settings = ConfigLoader::from_env_file(path)?;
        self.replace(settings);
        tracing::info!("configuration reloaded");
        Ok(self.current())
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

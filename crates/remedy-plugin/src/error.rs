//! Plugin errors

/// Errors raised while loading or addressing plugins
///
/// Hook failures are never errors; they are reported in a
/// [`crate::HookReport`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    /// No plugin with this name is loaded
    #[error("plugin not found: {0}")]
    NotFound(String),

    /// A plugin with this name is already loaded
    #[error("plugin already loaded: {0}")]
    Duplicate(String),

    /// The plugin factory failed
    #[error("plugin factory {label} failed: {message}")]
    FactoryFailed { label: String, message: String },

    /// `init` returned an error or panicked
    #[error("plugin {name} failed to initialise: {message}")]
    InitFailed { name: String, message: String },
}

impl PluginError {
    /// Name of the plugin (or factory label) involved
    #[must_use]
    pub fn plugin(&self) -> &str {
        match self {
            PluginError::NotFound(name) | PluginError::Duplicate(name) => name,
            PluginError::FactoryFailed { label, .. } => label,
            PluginError::InitFailed { name, .. } => name,
        }
    }
}

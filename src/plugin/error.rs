//! Plugin Error Handling

use crate::plugin::types::{Lifecycle, PluginType};
use crate::source::error::EngineError;

/// Result type alias for plugin operations
pub type PluginResult<T> = std::result::Result<T, PluginError>;

/// Errors from plugin registration and lifecycle management
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Plugin not found: {plugin_type}")]
    PluginNotFound { plugin_type: PluginType },

    #[error("Plugin '{plugin_type}' is already registered")]
    AlreadyRegistered { plugin_type: PluginType },

    #[error("Plugin '{plugin_type}' cannot {operation} while {state}")]
    InvalidLifecycle {
        plugin_type: PluginType,
        operation: String,
        state: Lifecycle,
    },

    #[error("Plugin manager has been destroyed")]
    ManagerDestroyed,

    #[error("{message}")]
    Synchronisation { message: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

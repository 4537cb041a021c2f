//! Engine Error Types

use crate::core::error_handling::ContextualError;
use std::path::PathBuf;

/// Errors produced while resolving options
///
/// None of these ever cross the plugin boundary as a panic; every caller
/// converts them into a defined state shape (empty or retained options).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    #[error("Invalid data source descriptor: {reason}")]
    InvalidDescriptor { reason: String },

    #[error("Service does not provide method '{api}'")]
    MethodNotFound { api: String },

    #[error("Fetch via '{api}' failed: {cause}")]
    Fetch { api: String, cause: String },

    #[error("Unexpected response shape from '{api}': {message}")]
    ResponseShape { api: String, message: String },

    #[error("'{operation}' called after the engine was destroyed")]
    Destroyed { operation: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl ContextualError for EngineError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            EngineError::Configuration { .. } | EngineError::InvalidDescriptor { .. }
        )
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            EngineError::Configuration { message } => Some(message),
            EngineError::InvalidDescriptor { reason } => Some(reason),
            _ => None,
        }
    }
}

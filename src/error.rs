//! Error types for the chat engine

use thiserror::Error;

/// Result type for chat engine operations
pub type Result<T> = std::result::Result<T, ChatEngineError>;

/// Errors that can occur in the chat engine
#[derive(Debug, Error)]
pub enum ChatEngineError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Invalid state error
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// Config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl ChatEngineError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

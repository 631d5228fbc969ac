//! Error types for extension authors

use thiserror::Error;

/// Errors that extensions can return from lifecycle callbacks
#[derive(Error, Debug)]
pub enum ExtensionError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Duplicate service registration within one extension
    #[error("Duplicate service: {0}")]
    DuplicateService(String),

    /// The extension is not in a state where the callback makes sense
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

impl ExtensionError {
    /// Create a custom error with a message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

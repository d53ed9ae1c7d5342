//! Error types for trackbridge.

use thiserror::Error;

/// Main error type for trackbridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A tool declared a parameter list that cannot be turned into a schema
    #[error("Invalid schema for tool '{tool}': {message}")]
    Schema { tool: String, message: String },

    /// A tool with the same name is already registered
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for trackbridge operations.
pub type Result<T> = std::result::Result<T, Error>;

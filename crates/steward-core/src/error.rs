//! Error types for Steward

use thiserror::Error;

/// Result type alias for Steward operations
pub type StewardResult<T> = Result<T, StewardError>;

/// Main error type for Steward
#[derive(Error, Debug, Clone)]
pub enum StewardError {
    /// Configuration related errors (settings file, storage paths)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Host shim errors (workspace edits, documents, commands)
    #[error("Host error: {0}")]
    Host(String),

    /// Command registry errors
    #[error("Command error: {name}: {message}")]
    Command { name: String, message: String },

    /// Turn-protocol errors (malformed events, unexpected messages)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Agent core errors
    #[error("Agent error: {0}")]
    Agent(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Task was cancelled
    #[error("Task was cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl StewardError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new host shim error
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host(message.into())
    }

    /// Create a new command registry error
    pub fn command(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Create a new agent error
    pub fn agent(message: impl Into<String>) -> Self {
        Self::Agent(message.into())
    }
}

impl From<anyhow::Error> for StewardError {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(error.to_string())
    }
}

impl From<std::io::Error> for StewardError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for StewardError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

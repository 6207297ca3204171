//! Error types for vmprov

use thiserror::Error;

/// Result type alias using the vmprov Error
pub type Result<T> = std::result::Result<T, Error>;

/// vmprov error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("{label} failed: [{code}] {message} (operation {operation})")]
    Operation {
        label: String,
        code: String,
        message: String,
        operation: String,
    },

    #[error("{label} did not complete within {seconds}s (operation {operation})")]
    Timeout {
        label: String,
        seconds: u64,
        operation: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether this error stems from missing or rejected credentials
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth(_))
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

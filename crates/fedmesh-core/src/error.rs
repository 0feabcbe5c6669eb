//! Error types for fedmesh core library.

use thiserror::Error;

/// Result type alias using fedmesh Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for fedmesh operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required setting is absent from every configuration layer
    #[error("Missing configuration: {setting} ({hint})")]
    ConfigMissing {
        setting: &'static str,
        hint: &'static str,
    },

    /// Node name is not usable as a document key
    #[error("Invalid node name {0:?}: use letters, digits, '.', '_' or '-'")]
    InvalidNodeName(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

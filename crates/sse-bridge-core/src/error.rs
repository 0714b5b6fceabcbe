//! Error types for envelope parsing and validation.

use thiserror::Error;

/// Errors that can occur while parsing or validating a JSON-RPC envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Error during JSON serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The body parsed as JSON but does not satisfy the envelope shape
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// The envelope carries an unsupported protocol version
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using EnvelopeError
pub type Result<T> = std::result::Result<T, EnvelopeError>;

//! Error types for bridge server operations.
//!
//! The variants distinguish recoverable client errors (bad content type,
//! malformed body) from errors that are fatal to a transport (write
//! failure) and from caller errors that change no state at all
//! (`NotConnected`, `SessionNotFound`). [`BridgeError::status`] maps each
//! kind to the HTTP class the routes layer answers with.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sse_bridge_core::SessionId;
use thiserror::Error;

/// Errors that can occur in bridge transport and routing operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Operation attempted before the stream was opened or after it closed
    #[error("SSE connection not established")]
    NotConnected,

    /// `start` called on a transport whose stream is already attached
    #[error("SSE transport already started")]
    AlreadyStarted,

    /// POST body carried a non-JSON content type
    #[error("Unsupported content-type: {0}")]
    UnsupportedContentType(String),

    /// POST body failed JSON parsing or the envelope shape check
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Sink-level I/O failure on the push stream
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Message posted to an unknown or expired session
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// Serialization error while encoding an outbound frame
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// The HTTP status this error surfaces as.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotConnected => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AlreadyStarted => StatusCode::CONFLICT,
            Self::UnsupportedContentType(_) => StatusCode::BAD_REQUEST,
            Self::MalformedMessage(_) => StatusCode::BAD_REQUEST,
            Self::WriteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True when the error leaves its transport usable for further calls.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedContentType(_) | Self::MalformedMessage(_)
        )
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Result type alias using BridgeError
pub type Result<T> = std::result::Result<T, BridgeError>;

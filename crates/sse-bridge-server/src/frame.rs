//! SSE wire-format helpers.
//!
//! An event frame is a self-delimited unit on the push stream: an event
//! type tag, a single data line, and a blank line as terminator.

use sse_bridge_core::{JsonRpcMessage, SessionId};

use crate::error::Result;

/// Event tag of the handshake frame advertising the POST endpoint.
pub const ENDPOINT_EVENT: &str = "endpoint";

/// Event tag of a JSON-RPC message frame.
pub const MESSAGE_EVENT: &str = "message";

/// One discrete event frame on the push stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Event type tag.
    pub event: &'static str,
    /// Payload carried on the `data:` line.
    pub data: String,
}

impl SseFrame {
    /// The handshake frame, carrying the POST endpoint with the session id
    /// embedded as a query parameter.
    pub fn endpoint(endpoint: &str, session_id: &SessionId) -> Self {
        Self {
            event: ENDPOINT_EVENT,
            data: format!("{}?sessionId={}", endpoint, session_id),
        }
    }

    /// A message frame with the canonical JSON encoding of `message`.
    pub fn message(message: &JsonRpcMessage) -> Result<Self> {
        Ok(Self {
            event: MESSAGE_EVENT,
            data: serde_json::to_string(message)?,
        })
    }

    /// The exact bytes this frame occupies on the wire.
    pub fn to_wire(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.event, self.data)
    }
}

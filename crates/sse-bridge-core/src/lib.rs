//! SSE Bridge Core Types
//!
//! This crate provides the protocol-neutral core for the SSE JSON-RPC bridge:
//! the JSON-RPC 2.0 envelope types, shape-only validation of inbound message
//! bodies, and the session identifier newtype used to correlate a push stream
//! with its POST intake endpoint.
//!
//! The transport layer (`sse-bridge-server`) treats everything here as
//! opaque: it validates the *shape* of a message and never interprets its
//! payload. Higher protocol layers consume the parsed [`JsonRpcMessage`]
//! through the handler seam the server crate exposes.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sse_bridge_core::{parse_message, JsonRpcMessage, SessionId};
//!
//! let msg = parse_message(r#"{"jsonrpc":"2.0","method":"ping","id":1}"#)?;
//! ```

pub mod error;
pub mod message;
pub mod session;

// Re-export key types for convenience
pub use error::{EnvelopeError, Result};

/// Re-export serde_json::Value for consistent JSON handling across the crate
pub use serde_json::Value as JsonValue;

pub use message::{
    parse_message, parse_value, JsonRpcErrorObject, JsonRpcErrorResponse, JsonRpcMessage,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId, JSONRPC_VERSION,
};
pub use session::SessionId;

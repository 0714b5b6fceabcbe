//! SSE JSON-RPC Bridge Server
//!
//! This crate turns two unidirectional HTTP primitives - a long-lived
//! server-to-client SSE stream and stateless client-to-server POSTs -
//! into one bidirectional JSON-RPC channel per session.
//!
//! # Overview
//!
//! - **Transport**: [`SseServerTransport`] owns one push stream and one
//!   session id; it enforces the `Idle -> Open -> Closed` state machine,
//!   frames outgoing messages, and dispatches inbound POST bodies.
//! - **Session Router**: [`SessionRouter`] maps a session key to exactly
//!   one live transport, creating it lazily on first contact and
//!   discarding it on close.
//! - **HTTP layer**: [`BridgeServer`] wires both into axum routes
//!   (`GET /sse`, `POST /message`, `POST /send`, `GET /health`).
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sse_bridge_server::{
//!     BridgeConfig, BridgeServer, JsonRpcMessage, SessionHandler, SessionId,
//! };
//!
//! struct Handler;
//!
//! impl SessionHandler for Handler {
//!     fn on_message(&self, session_id: &SessionId, message: JsonRpcMessage) {
//!         // inspect `message`, answer through the router's `send`
//!     }
//! }
//!
//! let server = BridgeServer::new(BridgeConfig::default(), Arc::new(Handler));
//! tokio::spawn(server.run());
//! ```

pub mod error;
pub mod frame;
pub mod router;
pub mod routes;
pub mod server;
pub mod transport;

// Re-export core types for convenience
pub use sse_bridge_core::{
    parse_message, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    RequestId, SessionId,
};

pub use error::{BridgeError, Result};
pub use frame::{SseFrame, ENDPOINT_EVENT, MESSAGE_EVENT};
pub use router::{SessionHandler, SessionRouter};
pub use routes::ServerState;
pub use server::{BridgeConfig, BridgeServer};
pub use transport::{SseServerTransport, StreamHandle, TransportState};

//! HTTP routes for the SSE bridge.
//!
//! This module provides the HTTP endpoints of the bridge:
//! - `GET /sse` - opens the push stream for a session
//! - `POST /message` - client-to-server message intake
//! - `POST /send` - server-side push for out-of-band producers
//! - `GET /health` - health check endpoint

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use sse_bridge_core::{parse_message, SessionId};
use tracing::{debug, warn};

use crate::router::SessionRouter;

/// Shared state for the bridge's axum handlers.
#[derive(Clone)]
pub struct ServerState {
    /// The session registry behind every endpoint.
    pub router: Arc<SessionRouter>,
}

/// Query parameters carrying the session id.
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// Health check endpoint.
pub async fn health(State(state): State<ServerState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "sse-bridge",
        "sessions": state.router.session_count(),
    }))
}

/// `GET /sse` - opens the push stream.
///
/// A missing `sessionId` gets a freshly generated one; the client learns
/// the id from the handshake frame's endpoint URL. Connecting to a session
/// whose stream is already open is rejected rather than silently adopted.
pub async fn sse_handler(
    State(state): State<ServerState>,
    Query(query): Query<SessionQuery>,
) -> Response {
    let session_id = query
        .session_id
        .map(SessionId::from)
        .unwrap_or_else(SessionId::random);

    let transport = state.router.connect(session_id.clone());
    match transport.start() {
        Ok(handle) => {
            debug!(session_id = %session_id, "stream opened");
            handle.into_sse_response().into_response()
        }
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "stream open rejected");
            e.into_response()
        }
    }
}

/// `POST /message` - client-to-server message intake.
pub async fn message_handler(
    State(state): State<ServerState>,
    Query(query): Query<SessionQuery>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let Some(session_id) = query.session_id.map(SessionId::from) else {
        return (StatusCode::BAD_REQUEST, "missing sessionId query parameter").into_response();
    };

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    match state.router.route_message(&session_id, content_type, &body) {
        Ok(()) => (StatusCode::ACCEPTED, "Accepted").into_response(),
        Err(e) => {
            debug!(session_id = %session_id, error = %e, "message rejected");
            e.into_response()
        }
    }
}

/// `POST /send` - pushes a server-originated message down the session's
/// stream. Intended for out-of-band producers colocated with the server.
pub async fn send_handler(
    State(state): State<ServerState>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> Response {
    let Some(session_id) = query.session_id.map(SessionId::from) else {
        return (StatusCode::BAD_REQUEST, "missing sessionId query parameter").into_response();
    };

    let message = match parse_message(&body) {
        Ok(message) => message,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match state.router.send(&session_id, &message) {
        Ok(()) => (StatusCode::OK, "Message sent").into_response(),
        Err(e) => e.into_response(),
    }
}

//! JSON-RPC 2.0 envelope types and shape validation.
//!
//! This module defines the message envelope the bridge carries: requests,
//! notifications, responses, and error responses. Validation here is
//! shape-only — `params` and `result` payloads stay opaque [`JsonValue`]s
//! and are never interpreted by the transport.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{EnvelopeError, Result};

/// The only protocol version this envelope accepts.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC request or response correlation id.
///
/// JSON-RPC 2.0 allows numbers and strings; both round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric id.
    Number(i64),
    /// String id.
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

/// A method invocation that expects a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    /// Correlation id echoed back in the response.
    pub id: RequestId,
    /// Name of the method being invoked.
    pub method: String,
    /// Opaque method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<JsonValue>,
}

/// A method invocation that expects no response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    /// Name of the method being invoked.
    pub method: String,
    /// Opaque method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<JsonValue>,
}

/// A successful response to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    /// Id of the request being answered.
    pub id: RequestId,
    /// Opaque result payload.
    pub result: JsonValue,
}

/// The error payload of an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    /// Numeric error code.
    pub code: i64,
    /// Short human-readable error description.
    pub message: String,
    /// Optional additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

/// An error response to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorResponse {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    /// Id of the request being answered. `null` when the request id could
    /// not be determined.
    pub id: Option<RequestId>,
    /// The error payload.
    pub error: JsonRpcErrorObject,
}

/// Any message the bridge can carry.
///
/// Variant order matters for untagged deserialization: a request carries
/// both `id` and `method`, so it must be tried before the notification
/// shape, which would otherwise match it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Request expecting a response.
    Request(JsonRpcRequest),
    /// Fire-and-forget notification.
    Notification(JsonRpcNotification),
    /// Successful response.
    Response(JsonRpcResponse),
    /// Error response.
    Error(JsonRpcErrorResponse),
}

impl JsonRpcMessage {
    /// The version string carried by this envelope.
    pub fn version(&self) -> &str {
        match self {
            Self::Request(m) => &m.jsonrpc,
            Self::Notification(m) => &m.jsonrpc,
            Self::Response(m) => &m.jsonrpc,
            Self::Error(m) => &m.jsonrpc,
        }
    }

    /// The method name, for requests and notifications.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(m) => Some(&m.method),
            Self::Notification(m) => Some(&m.method),
            _ => None,
        }
    }

    /// Canonical JSON encoding of this message.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<JsonRpcRequest> for JsonRpcMessage {
    fn from(m: JsonRpcRequest) -> Self {
        Self::Request(m)
    }
}

impl From<JsonRpcNotification> for JsonRpcMessage {
    fn from(m: JsonRpcNotification) -> Self {
        Self::Notification(m)
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(m: JsonRpcResponse) -> Self {
        Self::Response(m)
    }
}

/// Parses a raw body into a validated envelope.
///
/// Fails with [`EnvelopeError::InvalidMessage`] when the body is not JSON
/// or does not match any envelope shape, and with
/// [`EnvelopeError::Validation`] when the version field is not `"2.0"`.
pub fn parse_message(raw: &str) -> Result<JsonRpcMessage> {
    let message: JsonRpcMessage = serde_json::from_str(raw)
        .map_err(|e| EnvelopeError::InvalidMessage(format!("not a JSON-RPC envelope: {}", e)))?;
    validate_version(&message)?;
    Ok(message)
}

/// Parses an already-decoded JSON value into a validated envelope.
pub fn parse_value(value: JsonValue) -> Result<JsonRpcMessage> {
    let message: JsonRpcMessage = serde_json::from_value(value)
        .map_err(|e| EnvelopeError::InvalidMessage(format!("not a JSON-RPC envelope: {}", e)))?;
    validate_version(&message)?;
    Ok(message)
}

fn validate_version(message: &JsonRpcMessage) -> Result<()> {
    let version = message.version();
    if version != JSONRPC_VERSION {
        return Err(EnvelopeError::Validation(format!(
            "unsupported jsonrpc version: {:?}",
            version
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request() {
        let msg = parse_message(r#"{"jsonrpc":"2.0","method":"ping","id":1}"#).unwrap();
        match msg {
            JsonRpcMessage::Request(req) => {
                assert_eq!(req.method, "ping");
                assert_eq!(req.id, RequestId::Number(1));
                assert!(req.params.is_none());
            }
            other => panic!("expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_notification() {
        let msg =
            parse_message(r#"{"jsonrpc":"2.0","method":"notify","params":{"a":1}}"#).unwrap();
        match msg {
            JsonRpcMessage::Notification(n) => {
                assert_eq!(n.method, "notify");
                assert_eq!(n.params, Some(json!({"a": 1})));
            }
            other => panic!("expected notification, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_response() {
        let msg = parse_message(r#"{"jsonrpc":"2.0","id":"abc","result":{}}"#).unwrap();
        match msg {
            JsonRpcMessage::Response(r) => {
                assert_eq!(r.id, RequestId::String("abc".into()));
                assert_eq!(r.result, json!({}));
            }
            other => panic!("expected response, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_response() {
        let msg = parse_message(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32600,"message":"Invalid Request"}}"#,
        )
        .unwrap();
        match msg {
            JsonRpcMessage::Error(e) => {
                assert_eq!(e.error.code, -32600);
                assert_eq!(e.id, Some(RequestId::Number(1)));
            }
            other => panic!("expected error response, got {:?}", other),
        }
    }

    #[test]
    fn test_reject_non_json() {
        let err = parse_message("not json").unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidMessage(_)));
    }

    #[test]
    fn test_reject_wrong_shape() {
        // Valid JSON, but neither method nor result/error is present.
        let err = parse_message(r#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::InvalidMessage(_)));
    }

    #[test]
    fn test_reject_wrong_version() {
        let err = parse_message(r#"{"jsonrpc":"1.0","method":"ping","id":1}"#).unwrap_err();
        assert!(matches!(err, EnvelopeError::Validation(_)));
    }

    #[test]
    fn test_request_not_mistaken_for_notification() {
        let msg = parse_message(r#"{"jsonrpc":"2.0","method":"ping","id":7}"#).unwrap();
        assert!(matches!(msg, JsonRpcMessage::Request(_)));
    }

    #[test]
    fn test_canonical_encoding_round_trip() {
        let response = JsonRpcResponse {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: RequestId::Number(1),
            result: json!({}),
        };
        let encoded = JsonRpcMessage::from(response).to_json().unwrap();
        assert_eq!(encoded, r#"{"jsonrpc":"2.0","id":1,"result":{}}"#);
    }

    #[test]
    fn test_parse_value_accepts_decoded_body() {
        let msg = parse_value(json!({"jsonrpc":"2.0","method":"ping","id":1})).unwrap();
        assert_eq!(msg.method(), Some("ping"));
    }
}

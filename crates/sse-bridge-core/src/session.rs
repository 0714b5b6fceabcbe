//! Session identifier newtype.
//!
//! A session id correlates one push stream with its POST intake endpoint.
//! The router and transport treat it as an opaque string; [`SessionId::random`]
//! produces a UUIDv4-backed value but any externally-derived key (path
//! segment, platform actor identity) is accepted unchanged.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// SessionId: a newtype used to prevent mixing session keys with other
/// string values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a new random session id with UUID-class entropy.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Allows creating a session id from an externally-derived key.
impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Allows printing the id.
impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! Correlation types for request tracking
//!
//! These types identify the logical operation a log line belongs to. The
//! per-execution-unit storage that carries them lives in the logging crate;
//! this module only defines the values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::schema::{FIELD_REQUEST_ID, FIELD_TRACE_ID, FIELD_USER_ID};

/// Unique identifier for a single request or operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random RequestId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (e.g. an inbound `X-Request-Id` header)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trace identifier for distributed tracing across service boundaries
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(String);

impl TraceId {
    /// Generate a new random TraceId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (e.g. a propagated trace header)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the authenticated user a request acts for
///
/// User ids come from the session layer, so there is no generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlation slots carried by one logical unit of work
///
/// A value of this type is what gets copied into every log record, so it is
/// a plain snapshot: mutating it never affects records already built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl CorrelationContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request id
    pub fn with_request_id(mut self, request_id: &RequestId) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }

    /// Set the user id
    pub fn with_user_id(mut self, user_id: &UserId) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Set the trace id
    pub fn with_trace_id(mut self, trace_id: &TraceId) -> Self {
        self.trace_id = Some(trace_id.to_string());
        self
    }

    /// Overwrite the slots whose argument is non-empty, leaving the rest untouched
    pub fn set(&mut self, request_id: Option<&str>, user_id: Option<&str>, trace_id: Option<&str>) {
        fn assign(slot: &mut Option<String>, value: Option<&str>) {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                *slot = Some(v.to_string());
            }
        }
        assign(&mut self.request_id, request_id);
        assign(&mut self.user_id, user_id);
        assign(&mut self.trace_id, trace_id);
    }

    /// Reset every slot to empty
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when no slot carries a value
    pub fn is_empty(&self) -> bool {
        self.request_id.is_none() && self.user_id.is_none() && self.trace_id.is_none()
    }

    /// Only the non-empty slots, keyed by their canonical field names
    ///
    /// Order is fixed (request, user, trace) so rendered output is deterministic.
    pub fn filtered(&self) -> Map<String, Value> {
        let mut map = Map::new();
        let slots = [
            (FIELD_REQUEST_ID, &self.request_id),
            (FIELD_USER_ID, &self.user_id),
            (FIELD_TRACE_ID, &self.trace_id),
        ];
        for (key, slot) in slots {
            if let Some(value) = slot.as_deref().filter(|v| !v.is_empty()) {
                map.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
        map
    }
}

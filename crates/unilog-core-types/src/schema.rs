//! Canonical schema constants for structured log lines
//!
//! These constants keep the JSON line schema, the console renderer and the
//! instrumentation helpers in agreement.

// JSON line keys
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_LEVEL: &str = "level";
pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_MODULE: &str = "module";
pub const FIELD_FUNCTION: &str = "function";
pub const FIELD_LINE: &str = "line";
pub const FIELD_SOURCE: &str = "source";
pub const FIELD_CONTEXT: &str = "context";
pub const FIELD_ERROR_DETAILS: &str = "error_details";

// Correlation keys
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_USER_ID: &str = "user_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Instrumentation keys
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_ERROR: &str = "error";

// Bridged record keys
pub const FIELD_LOGGER: &str = "logger";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Instrumentation status values
pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Replacement written in place of any redacted value
pub const REDACTED: &str = "REDACTED";

/// Prefix of the message emitted by timing helpers
pub const PERFORMANCE_PREFIX: &str = "Performance: ";

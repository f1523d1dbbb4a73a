//! Canonical log record model

use std::error::Error;
use std::panic::Location;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use unilog_core_types::CorrelationContext;

use crate::level::Level;

/// Placeholder for call-site parts that could not be resolved
pub const UNKNOWN: &str = "unknown";

/// Where a record was emitted from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub module: String,
    pub function: Option<String>,
    pub line: Option<u32>,
}

impl CallSite {
    pub fn new(module: impl Into<String>, function: Option<&str>, line: Option<u32>) -> Self {
        Self {
            module: module.into(),
            function: function.map(str::to_string),
            line,
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN, None, None)
    }

    /// Build from a `#[track_caller]` location
    ///
    /// Rust keeps no function names at runtime, so only the module (derived
    /// from the source path) and the line are known.
    pub fn from_location(location: &Location<'_>) -> Self {
        Self::new(module_from_path(location.file()), None, Some(location.line()))
    }
}

/// `crates/app/src/handlers/chat.rs` -> `handlers::chat`
pub fn module_from_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let rel = match path.rfind("src/") {
        Some(idx) => &path[idx + 4..],
        None => path.rsplit('/').next().unwrap_or(path.as_str()),
    };
    let rel = rel.strip_suffix(".rs").unwrap_or(rel);
    let mut parts: Vec<&str> = rel.split('/').filter(|p| !p.is_empty()).collect();
    if parts.len() > 1 && parts.last() == Some(&"mod") {
        parts.pop();
    }
    if parts.is_empty() {
        UNKNOWN.to_string()
    } else {
        parts.join("::")
    }
}

/// Structured summary of the error active when a record was emitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetails {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub value: Option<String>,
    pub traceback: Option<String>,
}

impl ErrorDetails {
    /// Summarize a typed error; the traceback is its `source()` chain
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        Self {
            error_type: Some(std::any::type_name::<E>().to_string()),
            ..Self::from_dyn(err)
        }
    }

    /// Summarize a type-erased error; its concrete type is not recoverable
    pub fn from_dyn(err: &(dyn Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        Self {
            error_type: None,
            value: Some(err.to_string()),
            traceback: (!chain.is_empty()).then(|| chain.join("\n")),
        }
    }

    /// Summarize any displayable failure value
    pub fn from_display<E: std::fmt::Display>(err: &E) -> Self {
        Self {
            error_type: Some(std::any::type_name::<E>().to_string()),
            value: Some(err.to_string()),
            traceback: None,
        }
    }

    /// Summarize a panic
    pub fn from_panic(message: &str, location: Option<String>, backtrace: Option<String>) -> Self {
        let traceback = match (location, backtrace) {
            (Some(loc), Some(bt)) => Some(format!("at {loc}\n{bt}")),
            (Some(loc), None) => Some(format!("at {loc}")),
            (None, bt) => bt,
        };
        Self {
            error_type: Some("panic".to_string()),
            value: Some(message.to_string()),
            traceback,
        }
    }
}

/// One log event
///
/// Built once per log call and never mutated afterwards; formatters only
/// read it. Correlation ids are a snapshot taken at construction.
#[derive(Debug, Clone)]
pub struct LogRecord {
    timestamp: DateTime<Utc>,
    level: Level,
    message: String,
    callsite: CallSite,
    caller_override: Option<CallSite>,
    correlation: CorrelationContext,
    source: String,
    context: Map<String, Value>,
    error_details: Option<ErrorDetails>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>, callsite: CallSite, source: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            callsite,
            caller_override: None,
            correlation: CorrelationContext::default(),
            source: source.to_string(),
            context: Map::new(),
            error_details: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_correlation(mut self, correlation: CorrelationContext) -> Self {
        self.correlation = correlation;
        self
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    /// Attach error details; ignored below Error level
    pub fn with_error_details(mut self, details: Option<ErrorDetails>) -> Self {
        if self.level.carries_error_details() {
            self.error_details = details;
        }
        self
    }

    /// Re-attribute the record to another caller for display
    pub fn with_caller_override(mut self, caller: CallSite) -> Self {
        self.caller_override = Some(caller);
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The record's own call site
    pub fn callsite(&self) -> &CallSite {
        &self.callsite
    }

    pub fn caller_override(&self) -> Option<&CallSite> {
        self.caller_override.as_ref()
    }

    /// Call site to display: the override when present
    pub fn display_callsite(&self) -> &CallSite {
        self.caller_override.as_ref().unwrap_or(&self.callsite)
    }

    pub fn correlation(&self) -> &CorrelationContext {
        &self.correlation
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.correlation.trace_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.correlation.request_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.correlation.user_id.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn error_details(&self) -> Option<&ErrorDetails> {
        self.error_details.as_ref()
    }
}

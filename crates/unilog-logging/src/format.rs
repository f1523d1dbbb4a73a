//! Record renderers: one JSON object per line, or a human console line
//!
//! Both renderers show the record's display call site (the caller override
//! when one is set). Neither can fail: a field that cannot be rendered is
//! replaced by a placeholder and counted.

use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::level::Level;
use crate::record::{ErrorDetails, LogRecord, UNKNOWN};
use crate::stats::PipelineStats;

/// Written in place of a field that failed to render
pub const FORMAT_PLACEHOLDER: &str = "<unformattable>";

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Serialize)]
struct JsonLine<'a> {
    timestamp: String,
    level: Level,
    message: &'a str,
    module: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    function: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    source: &'a str,
    context: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_details: Option<&'a ErrorDetails>,
}

/// JSON line renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Render one newline-terminated JSON object
    pub fn format(&self, record: &LogRecord, stats: &PipelineStats) -> Vec<u8> {
        let site = record.display_callsite();
        let mut line = JsonLine {
            timestamp: record
                .timestamp()
                .to_rfc3339_opts(SecondsFormat::Micros, true),
            level: record.level(),
            message: record.message(),
            module: &site.module,
            function: site.function.as_deref(),
            line: site.line,
            trace_id: record.trace_id(),
            request_id: record.request_id(),
            user_id: record.user_id(),
            source: record.source(),
            context: record.context(),
            error_details: record.error_details(),
        };

        let mut bytes = match serde_json::to_vec(&line) {
            Ok(bytes) => bytes,
            Err(_) => {
                stats.record_format_placeholder();
                let placeholder_context = placeholder_map();
                line.context = &placeholder_context;
                line.error_details = None;
                serde_json::to_vec(&line).unwrap_or_else(|_| minimal_line(record))
            }
        };
        bytes.push(b'\n');
        bytes
    }
}

fn placeholder_map() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("format_error".to_string(), Value::from(FORMAT_PLACEHOLDER));
    map
}

fn minimal_line(record: &LogRecord) -> Vec<u8> {
    let value = serde_json::json!({
        "timestamp": record.timestamp().to_rfc3339_opts(SecondsFormat::Micros, true),
        "level": record.level().as_str(),
        "message": FORMAT_PLACEHOLDER,
        "module": UNKNOWN,
        "source": record.source(),
        "context": {},
    });
    value.to_string().into_bytes()
}

/// Human-readable renderer
///
/// `2026-10-18 09:15:02.114 | INFO     | chat::session:join:42 | joined | {"room":"r1"}`
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFormatter {
    /// Render the context map dim with ANSI escapes
    pub ansi: bool,
}

impl ConsoleFormatter {
    pub fn new(ansi: bool) -> Self {
        Self { ansi }
    }

    /// Render one line without the trailing newline
    pub fn format(&self, record: &LogRecord, stats: &PipelineStats) -> String {
        let site = record.display_callsite();
        let mut out = format!(
            "{} | {:<8} | {}:{}:{} | {}",
            record.timestamp().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level().as_str(),
            site.module,
            site.function.as_deref().unwrap_or(UNKNOWN),
            site.line.unwrap_or(0),
            record.message(),
        );

        if !record.context().is_empty() {
            let rendered = serde_json::to_string(record.context()).unwrap_or_else(|_| {
                stats.record_format_placeholder();
                FORMAT_PLACEHOLDER.to_string()
            });
            if self.ansi {
                out.push_str(&format!(" | {DIM}{rendered}{RESET}"));
            } else {
                out.push_str(&format!(" | {rendered}"));
            }
        }

        if let Some(details) = record.error_details() {
            out.push_str(&format!(
                "\n{}: {}",
                details.error_type.as_deref().unwrap_or("error"),
                details.value.as_deref().unwrap_or("")
            ));
            if let Some(tb) = &details.traceback {
                out.push('\n');
                out.push_str(tb);
            }
        }
        out
    }
}

/// Output format of a sink
#[derive(Debug, Clone, Copy)]
pub enum Format {
    Json,
    Console { ansi: bool },
}

impl Format {
    /// Newline-terminated bytes ready for a single write
    pub fn render(&self, record: &LogRecord, stats: &PipelineStats) -> Vec<u8> {
        match self {
            Format::Json => JsonFormatter.format(record, stats),
            Format::Console { ansi } => {
                let mut line = ConsoleFormatter::new(*ansi).format(record, stats);
                line.push('\n');
                line.into_bytes()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CallSite;
    use chrono::TimeZone;
    use unilog_core_types::CorrelationContext;

    fn record() -> LogRecord {
        let mut ctx = Map::new();
        ctx.insert("room".into(), Value::from("r1"));
        ctx.insert("n".into(), Value::from(2));
        let mut correlation = CorrelationContext::new();
        correlation.set(Some("req-1"), None, Some("trace-1"));

        LogRecord::new(
            Level::Info,
            "joined",
            CallSite::new("chat::session", Some("join"), Some(42)),
            "backend",
        )
        .with_timestamp(chrono::Utc.with_ymd_and_hms(2026, 10, 18, 9, 15, 2).unwrap())
        .with_correlation(correlation)
        .with_context(ctx)
    }

    #[test]
    fn test_json_line_schema() {
        let stats = PipelineStats::new();
        let bytes = JsonFormatter.format(&record(), &stats);
        assert_eq!(bytes.last(), Some(&b'\n'));

        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["timestamp"], "2026-10-18T09:15:02.000000Z");
        assert_eq!(v["level"], "INFO");
        assert_eq!(v["message"], "joined");
        assert_eq!(v["module"], "chat::session");
        assert_eq!(v["function"], "join");
        assert_eq!(v["line"], 42);
        assert_eq!(v["request_id"], "req-1");
        assert_eq!(v["trace_id"], "trace-1");
        assert_eq!(v["source"], "backend");
        assert_eq!(v["context"]["room"], "r1");
    }

    #[test]
    fn test_json_omits_absent_optionals() {
        let stats = PipelineStats::new();
        let rec = LogRecord::new(Level::Debug, "m", CallSite::unknown(), "backend");
        let v: Value = serde_json::from_slice(&JsonFormatter.format(&rec, &stats)).unwrap();
        let obj = v.as_object().unwrap();
        for key in ["function", "line", "user_id", "request_id", "trace_id", "error_details"] {
            assert!(!obj.contains_key(key), "{key} should be omitted");
        }
        assert_eq!(v["context"], serde_json::json!({}));
    }

    #[test]
    fn test_json_context_keeps_order() {
        let stats = PipelineStats::new();
        let text = String::from_utf8(JsonFormatter.format(&record(), &stats)).unwrap();
        assert!(text.find("\"room\"").unwrap() < text.find("\"n\"").unwrap());
    }

    #[test]
    fn test_console_line() {
        let stats = PipelineStats::new();
        let line = ConsoleFormatter::new(false).format(&record(), &stats);
        assert_eq!(
            line,
            r#"2026-10-18 09:15:02.000 | INFO     | chat::session:join:42 | joined | {"room":"r1","n":2}"#
        );
    }

    #[test]
    fn test_console_without_context_and_unknowns() {
        let stats = PipelineStats::new();
        let rec = LogRecord::new(Level::Critical, "down", CallSite::unknown(), "backend");
        let line = ConsoleFormatter::new(false).format(&rec, &stats);
        assert!(line.ends_with("| CRITICAL | unknown:unknown:0 | down"));
    }

    #[test]
    fn test_console_dims_context_with_ansi() {
        let stats = PipelineStats::new();
        let line = ConsoleFormatter::new(true).format(&record(), &stats);
        assert!(line.contains("\x1b[2m{"));
        assert!(line.ends_with("\x1b[0m"));
    }

    #[test]
    fn test_caller_override_displayed() {
        let stats = PipelineStats::new();
        let rec = record().with_caller_override(CallSite::new("hyper::proto", None, Some(7)));
        let line = ConsoleFormatter::new(false).format(&rec, &stats);
        assert!(line.contains("| hyper::proto:unknown:7 |"));

        let v: Value = serde_json::from_slice(&JsonFormatter.format(&rec, &stats)).unwrap();
        assert_eq!(v["module"], "hyper::proto");
        assert_eq!(rec.callsite().module, "chat::session");
    }

    #[test]
    fn test_render_terminates_lines() {
        let stats = PipelineStats::new();
        for format in [Format::Json, Format::Console { ansi: false }] {
            let bytes = format.render(&record(), &stats);
            assert_eq!(bytes.iter().filter(|b| **b == b'\n').count(), 1);
            assert_eq!(bytes.last(), Some(&b'\n'));
        }
    }
}

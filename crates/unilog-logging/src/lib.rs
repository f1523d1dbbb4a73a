//! Structured logging and redaction pipeline
//!
//! This crate provides:
//! - An explicit logger handle (`UnifiedLogger`) built once from `LoggingConfig`
//! - Redaction of credentials, card numbers, SSNs and emails in messages and extras
//! - Per-unit correlation context (`context::scope`, `context::spawn`, `context::enter`)
//! - JSON line and console formatters over stdout, stderr and rotating file sinks
//! - Timing combinators (`with_timing`, `with_timing_async`, `timed`)
//! - Bridges for the `log` facade and the `tracing` ecosystem
//! - Test capture for deterministic assertions
//!
//! # Usage
//!
//! ```rust
//! use unilog_logging::{Extras, LoggingConfig};
//!
//! let logger = LoggingConfig::default().build().unwrap();
//! logger.info("service started", Extras::new().with("port", 8080));
//! logger.shutdown(std::time::Duration::from_secs(1));
//! ```
//!
//! # Logging Macros
//!
//! - `log_info!(logger, msg, key => value, ...)` and the other levels
//! - `log_op_start!(logger, op, ...)` - Log operation start
//! - `log_op_end!(logger, op, duration_ms = ...)` - Log operation end
//! - `log_op_error!(logger, op, err, duration_ms = ...)` - Log operation error

pub mod bridge;
pub mod config;
pub mod context;
pub mod extras;
pub mod format;
pub mod instrument;
pub mod level;
pub mod logger;
pub mod macros;
pub mod panic_hook;
pub mod record;
pub mod redaction;
pub mod rotation;
pub mod sink;
pub mod stats;
pub mod test_capture;

pub use bridge::{ForeignRecord, LogBridge, StdlibBridge, TracingBridgeLayer};
pub use config::LoggingConfig;
pub use context::{ContextGuard, UnscopedTask};
pub use extras::Extras;
pub use format::{ConsoleFormatter, Format, JsonFormatter};
pub use instrument::{timed, with_timing, with_timing_async};
pub use level::Level;
pub use logger::{LoggerBuilder, UnifiedLogger};
pub use panic_hook::install_panic_hook;
pub use record::{CallSite, ErrorDetails, LogRecord};
pub use redaction::{RedactionRule, SensitiveDataFilter};
pub use rotation::{RotatingFileWriter, RotationPolicy};
pub use sink::{AdmissionPredicate, Destination, ShutdownReport, SinkConfig, SinkRegistry, WriteMode};
pub use stats::{PipelineStats, PipelineStatsSnapshot};
pub use test_capture::TestCapture;
pub use unilog_core_types::{schema, CorrelationContext, RequestId, Sensitive, TraceId, UserId};

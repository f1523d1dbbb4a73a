//! The logging facade
//!
//! [`UnifiedLogger`] is a cheap, cloneable handle built once at startup and
//! passed to collaborators. Every call redacts the message and extras,
//! merges the caller's correlation context, builds one [`LogRecord`] and
//! hands it to the sink registry. Log methods never fail and never panic.

use std::error::Error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;

use unilog_core_types::schema::{FIELD_DURATION_MS, PERFORMANCE_PREFIX};
use unilog_core_types::CorrelationContext;
use unilog_errors::ExError;

use crate::context;
use crate::extras::Extras;
use crate::level::Level;
use crate::record::{CallSite, ErrorDetails, LogRecord};
use crate::redaction::{RedactionRule, SensitiveDataFilter};
use crate::sink::{AdmissionPredicate, ShutdownReport, SinkConfig, SinkRegistry};
use crate::stats::{PipelineStats, PipelineStatsSnapshot};

pub const DEFAULT_SOURCE: &str = "backend";

struct Inner {
    source: String,
    filter: SensitiveDataFilter,
    sinks: SinkRegistry,
    stats: Arc<PipelineStats>,
    min_level: Level,
}

/// Handle to a configured pipeline
#[derive(Clone)]
pub struct UnifiedLogger {
    inner: Arc<Inner>,
}

impl fmt::Debug for UnifiedLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnifiedLogger")
            .field("source", &self.inner.source)
            .field("sinks", &self.inner.sinks)
            .finish()
    }
}

/// Assembles a [`UnifiedLogger`]
pub struct LoggerBuilder {
    source: String,
    sinks: Vec<SinkConfig>,
    predicate: AdmissionPredicate,
    rules: Vec<RedactionRule>,
    blocked_keys: Vec<String>,
    stats: Arc<PipelineStats>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            sinks: Vec::new(),
            predicate: AdmissionPredicate::default(),
            rules: Vec::new(),
            blocked_keys: Vec::new(),
            stats: Arc::new(PipelineStats::new()),
        }
    }
}

impl LoggerBuilder {
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn sink(mut self, sink: SinkConfig) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Predicate for sinks that do not carry their own
    pub fn predicate(mut self, predicate: AdmissionPredicate) -> Self {
        self.predicate = predicate;
        self
    }

    /// Extra redaction rule, applied after the built-in ones
    pub fn rule(mut self, rule: RedactionRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Extra structured key to redact
    pub fn block_key(mut self, key: impl Into<String>) -> Self {
        self.blocked_keys.push(key.into());
        self
    }

    pub fn stats(mut self, stats: Arc<PipelineStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Open every sink
    ///
    /// # Errors
    ///
    /// Returns an `ERR_INVALID_PATH` error if a file sink cannot be opened.
    pub fn build(self) -> Result<UnifiedLogger, ExError> {
        let mut filter = SensitiveDataFilter::new(self.stats.clone());
        for rule in self.rules {
            filter.push_rule(rule);
        }
        for key in &self.blocked_keys {
            filter.block_key(key);
        }

        let min_level = self
            .sinks
            .iter()
            .map(|s| s.min_level)
            .min()
            .unwrap_or(Level::Critical);
        let sinks = SinkRegistry::build(self.sinks, self.predicate, self.stats.clone())?;

        Ok(UnifiedLogger {
            inner: Arc::new(Inner {
                source: self.source,
                filter,
                sinks,
                stats: self.stats,
                min_level,
            }),
        })
    }
}

impl UnifiedLogger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    pub fn source(&self) -> &str {
        &self.inner.source
    }

    pub fn filter(&self) -> &SensitiveDataFilter {
        &self.inner.filter
    }

    pub fn sinks(&self) -> &SinkRegistry {
        &self.inner.sinks
    }

    /// Whether any sink could accept a record at `level`
    pub fn enabled(&self, level: Level) -> bool {
        !self.inner.sinks.sinks().is_empty() && level >= self.inner.min_level
    }

    #[track_caller]
    pub fn debug(&self, message: &str, extras: Extras) {
        self.log(Level::Debug, message, extras);
    }

    #[track_caller]
    pub fn info(&self, message: &str, extras: Extras) {
        self.log(Level::Info, message, extras);
    }

    #[track_caller]
    pub fn warning(&self, message: &str, extras: Extras) {
        self.log(Level::Warning, message, extras);
    }

    #[track_caller]
    pub fn error(&self, message: &str, extras: Extras) {
        self.log(Level::Error, message, extras);
    }

    #[track_caller]
    pub fn critical(&self, message: &str, extras: Extras) {
        self.log(Level::Critical, message, extras);
    }

    /// Error record carrying a summary of `err`
    #[track_caller]
    pub fn error_with<E: Error + 'static>(&self, message: &str, err: &E, extras: Extras) {
        let callsite = CallSite::from_location(Location::caller());
        self.log_at_with(Level::Error, message, extras, callsite, Some(ErrorDetails::from_error(err)));
    }

    /// Critical record carrying a summary of `err`
    #[track_caller]
    pub fn critical_with<E: Error + 'static>(&self, message: &str, err: &E, extras: Extras) {
        let callsite = CallSite::from_location(Location::caller());
        self.log_at_with(
            Level::Critical,
            message,
            extras,
            callsite,
            Some(ErrorDetails::from_error(err)),
        );
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: &str, extras: Extras) {
        let callsite = CallSite::from_location(Location::caller());
        self.log_at(level, message, extras, callsite);
    }

    /// Log with an explicit call site
    pub fn log_at(&self, level: Level, message: &str, extras: Extras, callsite: CallSite) {
        self.log_at_with(level, message, extras, callsite, None);
    }

    /// Log with an explicit call site and optional error details
    ///
    /// Details are kept only for Error and Critical. Without explicit
    /// details, a record emitted while the thread is panicking gets a panic
    /// summary.
    pub fn log_at_with(
        &self,
        level: Level,
        message: &str,
        extras: Extras,
        callsite: CallSite,
        details: Option<ErrorDetails>,
    ) {
        self.emit(level, message, extras, callsite, details, None);
    }

    pub(crate) fn emit(
        &self,
        level: Level,
        message: &str,
        extras: Extras,
        callsite: CallSite,
        details: Option<ErrorDetails>,
        caller_override: Option<CallSite>,
    ) {
        if !self.enabled(level) {
            return;
        }
        let inner = &*self.inner;

        for _ in 0..extras.unserializable_count() {
            inner.stats.record_unserializable();
        }

        let message = inner.filter.filter_message(message);
        let correlation = context::snapshot();
        let mut merged = correlation.filtered();
        for (key, value) in inner.filter.filter_map(extras.into_map()) {
            merged.insert(key, value);
        }

        let details = if level.carries_error_details() {
            details
                .or_else(|| std::thread::panicking().then(panicking_details))
                .map(|d| self.redact_details(d))
        } else {
            None
        };

        let mut record = LogRecord::new(level, message, callsite, &inner.source)
            .with_correlation(correlation)
            .with_context(merged)
            .with_error_details(details);
        if let Some(caller) = caller_override {
            record = record.with_caller_override(caller);
        }

        inner.sinks.dispatch(&record);
    }

    fn redact_details(&self, details: ErrorDetails) -> ErrorDetails {
        let filter = &self.inner.filter;
        ErrorDetails {
            error_type: details.error_type,
            value: details.value.map(|v| filter.filter_message(&v)),
            traceback: details.traceback.map(|t| filter.filter_message(&t)),
        }
    }

    /// `Performance: <operation>` at Info with `duration_ms`
    #[track_caller]
    pub fn performance(&self, operation: &str, duration: Duration, extras: Extras) {
        let callsite = CallSite::from_location(Location::caller());
        self.performance_at(Level::Info, operation, duration, extras, callsite, None);
    }

    pub(crate) fn performance_at(
        &self,
        level: Level,
        operation: &str,
        duration: Duration,
        extras: Extras,
        callsite: CallSite,
        details: Option<ErrorDetails>,
    ) {
        let mut fields = Extras::new().with(FIELD_DURATION_MS, duration_ms(duration));
        for (key, value) in extras.iter() {
            fields.insert(key.clone(), value);
        }
        let message = format!("{PERFORMANCE_PREFIX}{operation}");
        self.log_at_with(level, &message, fields, callsite, details);
    }

    /// Set the non-empty ids on the calling unit's context
    ///
    /// From a tokio task not started through [`context::scope`] or
    /// [`context::spawn`] the write is ignored and counted in [`Self::stats`].
    pub fn set_context(&self, request_id: Option<&str>, user_id: Option<&str>, trace_id: Option<&str>) {
        if context::set(request_id, user_id, trace_id).is_err() {
            self.inner.stats.record_unscoped_context_write("set_context");
        }
    }

    pub fn clear_context(&self) {
        if context::clear().is_err() {
            self.inner.stats.record_unscoped_context_write("clear_context");
        }
    }

    pub fn context(&self) -> CorrelationContext {
        context::snapshot()
    }

    pub fn stats(&self) -> PipelineStatsSnapshot {
        let mut snapshot = self.inner.stats.snapshot();
        snapshot.dropped_records += self.inner.sinks.queue_drops();
        snapshot
    }

    /// Drain sinks, waiting at most `timeout`
    ///
    /// Records logged afterwards are counted as dropped.
    pub fn shutdown(&self, timeout: Duration) -> ShutdownReport {
        self.inner.sinks.shutdown(timeout)
    }
}

fn panicking_details() -> ErrorDetails {
    ErrorDetails::from_panic("thread is panicking", None, None)
}

/// Milliseconds with microsecond precision
pub(crate) fn duration_ms(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 1_000_000.0).round() / 1_000.0
}

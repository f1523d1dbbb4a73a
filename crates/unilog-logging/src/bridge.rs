//! Re-emit records from foreign logging frameworks through the pipeline
//!
//! Third-party crates log through the `log` facade or through `tracing`.
//! [`LogBridge`] and [`TracingBridgeLayer`] plug into those frameworks'
//! own extension points and convert each event into a [`ForeignRecord`],
//! which [`StdlibBridge`] forwards with the foreign call site attached as
//! the caller override.

use std::fmt;
use std::panic::Location;

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;
use unilog_core_types::schema::FIELD_LOGGER;
use unilog_errors::{ExError, LoggingError};

use crate::extras::Extras;
use crate::level::Level;
use crate::logger::UnifiedLogger;
use crate::record::{module_from_path, CallSite, ErrorDetails, UNKNOWN};

/// Foreign targets intercepted by default
pub const DEFAULT_TARGETS: &[&str] = &[
    "hyper",
    "h2",
    "axum",
    "tower_http",
    "reqwest",
    "sqlx",
    "rusqlite",
    "tokio_tungstenite",
    "tungstenite",
    "fake",
];

/// Matches every target
pub const ALL_TARGETS: &str = "*";

/// A log event as a foreign framework described it
#[derive(Debug, Clone, Default)]
pub struct ForeignRecord {
    pub logger: String,
    pub level_name: String,
    pub level_number: u32,
    pub message: String,
    pub module: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub error: Option<String>,
    pub fields: Extras,
}

impl ForeignRecord {
    pub fn new(
        logger: impl Into<String>,
        level_name: impl Into<String>,
        level_number: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            logger: logger.into(),
            level_name: level_name.into(),
            level_number,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_fields(mut self, fields: Extras) -> Self {
        self.fields = fields;
        self
    }

    /// Mapped by name, falling back to the numeric value
    pub fn level(&self) -> Level {
        Level::from_foreign(&self.level_name, self.level_number)
    }

    /// Where the foreign framework says the event came from
    pub fn caller(&self) -> CallSite {
        let module = self
            .module
            .clone()
            .or_else(|| self.file.as_deref().map(module_from_path))
            .unwrap_or_else(|| UNKNOWN.to_string());
        CallSite {
            module,
            function: None,
            line: self.line,
        }
    }

    pub fn from_log(record: &log::Record<'_>) -> Self {
        let level = Level::from(record.level());
        let mut foreign = Self::new(
            record.target(),
            record.level().as_str(),
            level.as_number(),
            record.args().to_string(),
        );
        foreign.module = record.module_path().map(str::to_string);
        foreign.file = record.file().map(str::to_string);
        foreign.line = record.line();
        foreign
    }
}

/// Target matcher and forwarder shared by the adapters
#[derive(Debug, Clone)]
pub struct StdlibBridge {
    logger: UnifiedLogger,
    targets: Vec<String>,
}

impl StdlibBridge {
    pub fn new(logger: UnifiedLogger) -> Self {
        Self {
            logger,
            targets: DEFAULT_TARGETS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Also intercept `prefix`; [`ALL_TARGETS`] intercepts everything
    pub fn with_target(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !self.targets.contains(&prefix) {
            self.targets.push(prefix);
        }
        self
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Whether records from `target` are forwarded
    pub fn intercepts(&self, target: &str) -> bool {
        self.targets.iter().any(|prefix| {
            prefix == ALL_TARGETS
                || target == prefix
                || target
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with("::"))
        })
    }

    /// Re-emit a foreign record
    #[track_caller]
    pub fn forward(&self, record: ForeignRecord) {
        let level = record.level();
        if !self.logger.enabled(level) {
            return;
        }
        let caller = record.caller();
        let own = CallSite::from_location(Location::caller());

        let mut extras = Extras::new().with(FIELD_LOGGER, &record.logger);
        for (key, value) in record.fields.iter() {
            extras.insert(key.clone(), value);
        }
        let details = record.error.as_ref().map(|text| ErrorDetails {
            error_type: None,
            value: Some(text.clone()),
            traceback: None,
        });

        self.logger
            .emit(level, &record.message, extras, own, details, Some(caller));
    }

    /// Route the `log` facade through this bridge
    ///
    /// # Errors
    ///
    /// Returns `ERR_ALREADY_INSTALLED` if a `log` logger is already set.
    pub fn install_log_bridge(self) -> Result<(), ExError> {
        log::set_boxed_logger(Box::new(LogBridge::new(self))).map_err(|_| {
            ExError::from(LoggingError::AlreadyInstalled {
                target: "log facade logger".to_string(),
            })
        })?;
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    }

    /// Make a registry with this bridge's layer the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns `ERR_ALREADY_INSTALLED` if a global subscriber is already set.
    pub fn install_tracing_bridge(self) -> Result<(), ExError> {
        let subscriber = tracing_subscriber::registry().with(self.layer());
        tracing::subscriber::set_global_default(subscriber).map_err(|_| {
            ExError::from(LoggingError::AlreadyInstalled {
                target: "tracing global subscriber".to_string(),
            })
        })
    }

    pub fn layer(self) -> TracingBridgeLayer {
        TracingBridgeLayer { bridge: self }
    }
}

/// `log::Log` adapter
#[derive(Debug)]
pub struct LogBridge {
    bridge: StdlibBridge,
}

impl LogBridge {
    pub fn new(bridge: StdlibBridge) -> Self {
        Self { bridge }
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.bridge.intercepts(metadata.target())
            && self.bridge.logger.enabled(Level::from(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        if self.enabled(record.metadata()) {
            self.bridge.forward(ForeignRecord::from_log(record));
        }
    }

    fn flush(&self) {}
}

struct FieldVisitor {
    message: Option<String>,
    error: Option<String>,
    fields: Extras,
}

impl FieldVisitor {
    fn new() -> Self {
        Self {
            message: None,
            error: None,
            fields: Extras::new(),
        }
    }

    fn put(&mut self, field: &Field, value: Value) {
        match field.name() {
            "message" => {
                self.message = Some(match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
            }
            name => self.fields.insert(name, value),
        }
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.error = Some(value.to_string());
        self.put(field, Value::String(value.to_string()));
    }
}

/// `tracing_subscriber` layer adapter
#[derive(Debug, Clone)]
pub struct TracingBridgeLayer {
    bridge: StdlibBridge,
}

impl<S> Layer<S> for TracingBridgeLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self.bridge.intercepts(metadata.target()) {
            return;
        }

        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);

        let level = Level::from(metadata.level());
        let mut record = ForeignRecord::new(
            metadata.target(),
            metadata.level().as_str(),
            level.as_number(),
            visitor.message.unwrap_or_default(),
        )
        .with_fields(visitor.fields);
        record.module = metadata.module_path().map(str::to_string);
        record.file = metadata.file().map(str::to_string);
        record.line = metadata.line();
        record.error = visitor.error;

        self.bridge.forward(record);
    }
}

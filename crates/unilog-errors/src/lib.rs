//! Error facility for unilog
//!
//! Logging itself never returns errors to application code: write, format
//! and redaction failures are recovered inside the pipeline and only show up
//! in its counters. The errors defined here are the ones that *are* surfaced,
//! all of them at startup: invalid configuration, unusable sink
//! destinations, invalid redaction patterns, and bridge registration
//! conflicts.

use thiserror::Error;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable in tests and in startup
/// failure messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Configuration
    InvalidLevel,
    InvalidBool,
    InvalidPath,
    InvalidPattern,

    // Registration
    AlreadyInstalled,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidLevel => "ERR_INVALID_LEVEL",
            ExErrorKind::InvalidBool => "ERR_INVALID_BOOL",
            ExErrorKind::InvalidPath => "ERR_INVALID_PATH",
            ExErrorKind::InvalidPattern => "ERR_INVALID_PATTERN",
            ExErrorKind::AlreadyInstalled => "ERR_ALREADY_INSTALLED",
        }
    }

    /// Whether this kind is a startup configuration failure
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidLevel
                | ExErrorKind::InvalidBool
                | ExErrorKind::InvalidPath
                | ExErrorKind::InvalidPattern
        )
    }
}

/// Canonical structured error type
///
/// Classification fields for programmatic handling plus free-form context
/// for the startup failure message.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    key: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            key: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the configuration key (environment variable, sink name) involved
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the configuration key, if any
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(key) = &self.key {
            write!(f, " (key: {})", key)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for pipeline construction
#[derive(Error, Debug)]
pub enum LoggingError {
    /// Log level string could not be parsed
    #[error("Invalid log level '{value}' in {key}")]
    InvalidLevel { key: String, value: String },

    /// Boolean flag could not be parsed
    #[error("Invalid boolean '{value}' in {key}")]
    InvalidBool { key: String, value: String },

    /// File sink path is unusable
    #[error("Invalid log file path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Redaction rule pattern does not compile
    #[error("Invalid redaction pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A process-global hook (log facade, tracing default) is already taken
    #[error("{target} is already installed")]
    AlreadyInstalled { target: String },
}

impl From<LoggingError> for ExError {
    fn from(err: LoggingError) -> Self {
        match err {
            LoggingError::InvalidLevel { key, value } => ExError::new(ExErrorKind::InvalidLevel)
                .with_key(key)
                .with_op("parse_level")
                .with_message(format!("Unrecognized level '{}'", value)),

            LoggingError::InvalidBool { key, value } => ExError::new(ExErrorKind::InvalidBool)
                .with_key(key)
                .with_op("parse_bool")
                .with_message(format!("Unrecognized boolean '{}'", value)),

            LoggingError::InvalidPath { path, reason } => ExError::new(ExErrorKind::InvalidPath)
                .with_key(path)
                .with_op("open_file_sink")
                .with_message(reason),

            LoggingError::InvalidPattern { pattern, reason } => {
                ExError::new(ExErrorKind::InvalidPattern)
                    .with_key(pattern)
                    .with_op("compile_rule")
                    .with_message(reason)
            }

            LoggingError::AlreadyInstalled { target } => {
                ExError::new(ExErrorKind::AlreadyInstalled)
                    .with_key(target)
                    .with_op("install_bridge")
                    .with_message("Global hook already installed")
            }
        }
    }
}

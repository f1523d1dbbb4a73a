//! Log severity levels

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use unilog_errors::LoggingError;

/// Ordered log severity
///
/// Numeric values follow the widely used 10/20/30/40/50 scale so foreign
/// levels without a name mapping can be placed by number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    /// Upper-case display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// Numeric severity
    pub fn as_number(&self) -> u32 {
        match self {
            Level::Debug => 10,
            Level::Info => 20,
            Level::Warning => 30,
            Level::Error => 40,
            Level::Critical => 50,
        }
    }

    /// Place an arbitrary numeric severity on the nearest level at or below it
    ///
    /// Values under 10 (e.g. TRACE-style levels) clamp to Debug, values over 50
    /// clamp to Critical.
    pub fn from_number(value: u32) -> Self {
        match value {
            0..=19 => Level::Debug,
            20..=29 => Level::Info,
            30..=39 => Level::Warning,
            40..=49 => Level::Error,
            _ => Level::Critical,
        }
    }

    /// Map a level name, case-insensitively, including common aliases
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "DEBUG" => Some(Level::Debug),
            "INFO" | "NOTICE" => Some(Level::Info),
            "WARN" | "WARNING" => Some(Level::Warning),
            "ERROR" => Some(Level::Error),
            "CRITICAL" | "FATAL" => Some(Level::Critical),
            _ => None,
        }
    }

    /// Map a foreign record's level: by name first, falling back to its number
    pub fn from_foreign(name: &str, number: u32) -> Self {
        Self::from_name(name).unwrap_or_else(|| Self::from_number(number))
    }

    /// Whether records at this level may carry error details
    pub fn carries_error_details(&self) -> bool {
        *self >= Level::Error
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LoggingError;

    /// Accepts a level name or a decimal number
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(level) = Level::from_name(s) {
            return Ok(level);
        }
        s.trim()
            .parse::<u32>()
            .map(Level::from_number)
            .map_err(|_| LoggingError::InvalidLevel {
                key: "level".to_string(),
                value: s.to_string(),
            })
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warning,
            log::Level::Error => Level::Error,
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

//! Environment-driven pipeline configuration
//!
//! | variable | default |
//! |---|---|
//! | `LOG_LEVEL` | `INFO` |
//! | `ENABLE_FILE_LOGGING` | `false` |
//! | `ENABLE_JSON_LOGGING` | `false` |
//! | `LOG_FILE_PATH` | `logs/app.log` |
//! | `ENVIRONMENT` | `development` |
//! | `LOG_SOURCE` | `backend` |
//! | `LOG_NOISY_MODULES` | [`DEFAULT_NOISY_MODULES`] |
//!
//! Empty values count as unset.

use std::io::IsTerminal;
use std::path::PathBuf;

use unilog_errors::{ExError, LoggingError};

use crate::format::Format;
use crate::level::Level;
use crate::logger::{UnifiedLogger, DEFAULT_SOURCE};
use crate::rotation::RotationPolicy;
use crate::sink::{is_production, AdmissionPredicate, Destination, SinkConfig, DEFAULT_NOISY_MODULES};

pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_ENABLE_FILE_LOGGING: &str = "ENABLE_FILE_LOGGING";
pub const ENV_ENABLE_JSON_LOGGING: &str = "ENABLE_JSON_LOGGING";
pub const ENV_LOG_FILE_PATH: &str = "LOG_FILE_PATH";
pub const ENV_ENVIRONMENT: &str = "ENVIRONMENT";
pub const ENV_LOG_SOURCE: &str = "LOG_SOURCE";
pub const ENV_LOG_NOISY_MODULES: &str = "LOG_NOISY_MODULES";

pub const DEFAULT_LOG_FILE_PATH: &str = "logs/app.log";
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Resolved logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: Level,
    pub file_logging: bool,
    pub json_console: bool,
    pub file_path: PathBuf,
    pub environment: String,
    pub source: String,
    pub noisy_modules: Vec<String>,
    pub rotation: RotationPolicy,
    /// Dim console context with ANSI escapes
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::Info,
            file_logging: false,
            json_console: false,
            file_path: PathBuf::from(DEFAULT_LOG_FILE_PATH),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            noisy_modules: DEFAULT_NOISY_MODULES.iter().map(|m| m.to_string()).collect(),
            rotation: RotationPolicy::default(),
            ansi: false,
        }
    }
}

/// `1/0`, `true/false`, `yes/no`, `on/off`, case-insensitive
pub fn parse_bool(key: &str, value: &str) -> Result<bool, LoggingError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(LoggingError::InvalidBool {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

impl LoggingConfig {
    /// Read the process environment
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unparseable level or boolean.
    pub fn from_env() -> Result<Self, ExError> {
        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.ansi = std::io::stdout().is_terminal();
        Ok(config)
    }

    /// Read values from any key lookup
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unparseable level or boolean.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ExError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(ENV_LOG_LEVEL) {
            config.level = raw.parse::<Level>().map_err(|_| LoggingError::InvalidLevel {
                key: ENV_LOG_LEVEL.to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = get(ENV_ENABLE_FILE_LOGGING) {
            config.file_logging = parse_bool(ENV_ENABLE_FILE_LOGGING, &raw)?;
        }
        if let Some(raw) = get(ENV_ENABLE_JSON_LOGGING) {
            config.json_console = parse_bool(ENV_ENABLE_JSON_LOGGING, &raw)?;
        }
        if let Some(raw) = get(ENV_LOG_FILE_PATH) {
            config.file_path = PathBuf::from(raw.trim());
        }
        if let Some(raw) = get(ENV_ENVIRONMENT) {
            config.environment = raw.trim().to_string();
        }
        if let Some(raw) = get(ENV_LOG_SOURCE) {
            config.source = raw.trim().to_string();
        }
        if let Some(raw) = get(ENV_LOG_NOISY_MODULES) {
            config.noisy_modules = raw
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(config)
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_file_logging(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_logging = true;
        self.file_path = path.into();
        self
    }

    pub fn with_json_console(mut self, json: bool) -> Self {
        self.json_console = json;
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_noisy_modules(mut self, modules: Vec<String>) -> Self {
        self.noisy_modules = modules;
        self
    }

    pub fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn is_production(&self) -> bool {
        is_production(&self.environment)
    }

    pub fn predicate(&self) -> AdmissionPredicate {
        AdmissionPredicate::new(&self.environment, &self.noisy_modules)
    }

    /// Console sink, plus the JSON file sink when enabled
    pub fn sink_configs(&self) -> Vec<SinkConfig> {
        let console_format = if self.json_console {
            Format::Json
        } else {
            Format::Console { ansi: self.ansi }
        };
        let mut sinks =
            vec![SinkConfig::new("console", Destination::Stdout, console_format).with_min_level(self.level)];

        if self.file_logging {
            sinks.push(
                SinkConfig::new(
                    "file",
                    Destination::File {
                        path: self.file_path.clone(),
                        policy: self.rotation,
                    },
                    Format::Json,
                )
                .with_min_level(self.level),
            );
        }
        sinks
    }

    /// Open the sinks and return the logger
    ///
    /// # Errors
    ///
    /// Returns `ERR_INVALID_PATH` if the file sink cannot be opened.
    pub fn build(&self) -> Result<UnifiedLogger, ExError> {
        let mut builder = UnifiedLogger::builder()
            .source(self.source.clone())
            .predicate(self.predicate());
        for sink in self.sink_configs() {
            builder = builder.sink(sink);
        }
        builder.build()
    }
}

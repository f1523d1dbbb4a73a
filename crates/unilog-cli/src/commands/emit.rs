//! Emit command
//!
//! Usage: unilog emit [--level <LEVEL>] [--message <TEXT>] [--field KEY=VALUE]...

use clap::Args;
use std::time::Duration;
use unilog_core_types::{RequestId, TraceId};
use unilog_logging::{callsite, Extras, Level, LoggingConfig};

#[derive(Debug, Args)]
pub struct EmitArgs {
    /// Record level (name or number)
    #[arg(short, long, default_value = "INFO")]
    pub level: Level,

    /// Record message
    #[arg(short, long, default_value = "unilog sample")]
    pub message: String,

    /// Extra field, repeatable
    #[arg(short, long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Request id to attach (default: a fresh one)
    #[arg(long)]
    pub request_id: Option<String>,

    /// Milliseconds to wait for sinks to drain
    #[arg(long, default_value_t = 2000)]
    pub drain_ms: u64,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

/// Execute emit command
pub fn execute(args: EmitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = LoggingConfig::from_env()?;
    let logger = config.build()?;

    let request_id = args
        .request_id
        .unwrap_or_else(|| RequestId::new().as_str().to_string());
    let trace_id = TraceId::new();
    logger.set_context(Some(&request_id), None, Some(trace_id.as_str()));

    let extras: Extras = args.fields.into_iter().collect();
    logger.log_at(args.level, &args.message, extras, callsite!());

    let report = logger.shutdown(Duration::from_millis(args.drain_ms));
    if !report.is_clean() {
        eprintln!("abandoned sinks: {}", report.abandoned.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("room=r1"),
            Ok(("room".to_string(), "r1".to_string()))
        );
        assert_eq!(
            parse_field("query=a=b"),
            Ok(("query".to_string(), "a=b".to_string()))
        );
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }
}

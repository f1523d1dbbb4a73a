#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use unilog_logging::{
    log_error, log_info, Extras, Format, PipelineStats, RedactionRule, TestCapture, UnifiedLogger,
};

#[test]
fn test_panicking_rule_falls_back_and_is_counted() {
    let capture = TestCapture::new();
    let stats = Arc::new(PipelineStats::with_diagnostic_interval(Duration::from_secs(3600)));
    let rule = RedactionRule::with_fn("explosive", "boom", |_| panic!("rule bug")).unwrap();
    let logger = UnifiedLogger::builder()
        .stats(stats)
        .rule(rule)
        .sink(capture.sink_config(Format::Json))
        .build()
        .unwrap();

    log_info!(logger, "boom goes the rule");
    log_info!(logger, "boom again");
    log_info!(logger, "quiet message");

    let records = capture.json_records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["message"], "boom goes the rule");

    let snapshot = logger.stats();
    assert_eq!(snapshot.redaction_fallbacks, 2);
    assert_eq!(snapshot.diagnostics_emitted, 1);
    assert_eq!(snapshot.diagnostics_suppressed, 1);
}

#[test]
fn test_custom_rule_and_blocked_key() {
    let capture = TestCapture::new();
    let logger = UnifiedLogger::builder()
        .rule(RedactionRule::new("ticket", r"TCK-\d+", "TCK-REDACTED").unwrap())
        .block_key("session_ref")
        .sink(capture.sink_config(Format::Json))
        .build()
        .unwrap();

    log_error!(logger, "ticket TCK-4412 escalated", "session_ref" => "s-19", "room" => "r1");

    let record = &capture.json_records()[0];
    assert_eq!(record["message"], "ticket TCK-REDACTED escalated");
    assert_eq!(record["context"]["session_ref"], "REDACTED");
    assert_eq!(record["context"]["room"], "r1");
}

#[test]
fn test_written_records_are_counted() {
    let capture = TestCapture::new();
    let logger = capture.logger();
    for i in 0..5 {
        logger.info("m", Extras::new().with("i", i));
    }
    assert_eq!(logger.stats().records_written, 5);
    assert_eq!(logger.stats().dropped_records, 0);
}

#[test]
fn test_invalid_rule_pattern_is_a_config_error() {
    let err = RedactionRule::new("broken", "(unclosed", "x").unwrap_err();
    let err: unilog_errors::ExError = err.into();
    assert_eq!(err.code(), "ERR_INVALID_PATTERN");
}

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use serde_json::Value;
use unilog_errors::ExErrorKind;
use unilog_logging::{Extras, Level, LoggingConfig, RotationPolicy};

fn env(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_file_sink_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs/app.log");
    let config = LoggingConfig::from_lookup(env(&[
        ("ENABLE_FILE_LOGGING", "true".to_string()),
        ("LOG_FILE_PATH", path.display().to_string()),
        ("LOG_LEVEL", "DEBUG".to_string()),
        ("LOG_SOURCE", "gateway".to_string()),
    ]))
    .unwrap();
    let logger = config.build().unwrap();

    logger.debug("boot", Extras::new());
    logger.info("login token=abc", Extras::new().with("email", "a@b.io"));
    let report = logger.shutdown(Duration::from_secs(5));
    assert!(report.is_clean(), "abandoned: {:?}", report.abandoned);

    let content = fs::read_to_string(&path).unwrap();
    let records: Vec<Value> = content.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["level"], "DEBUG");
    assert_eq!(records[1]["message"], "login token=REDACTED");
    assert_eq!(records[1]["context"]["email"], "REDACTED");
    assert!(records.iter().all(|r| r["source"] == "gateway"));
}

#[test]
fn test_file_sink_respects_level() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let logger = LoggingConfig::default()
        .with_level(Level::Warning)
        .with_file_logging(&path)
        .build()
        .unwrap();

    logger.info("quiet", Extras::new());
    logger.warning("loud", Extras::new());
    logger.shutdown(Duration::from_secs(5));

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("\"loud\""));
}

#[test]
fn test_rotation_through_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    let logger = LoggingConfig::default()
        .with_file_logging(&path)
        .with_rotation(RotationPolicy {
            max_bytes: 512,
            ..RotationPolicy::default()
        })
        .build()
        .unwrap();

    for i in 0..20 {
        logger.info("filler record for rotation", Extras::new().with("i", i));
    }
    logger.shutdown(Duration::from_secs(5));

    let rotated: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        // Compression runs in the background; the plain rotated file may still be there.
        .filter(|name| name.starts_with("app.") && name != "app.log")
        .collect();
    assert!(!rotated.is_empty());
    assert!(fs::metadata(&path).unwrap().len() <= 512);
}

#[test]
fn test_records_after_shutdown_are_counted_as_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let logger = LoggingConfig::default()
        .with_file_logging(dir.path().join("app.log"))
        .build()
        .unwrap();

    logger.shutdown(Duration::from_secs(5));
    logger.error("late", Extras::new());
    assert_eq!(logger.stats().dropped_records, 1);
}

#[test]
fn test_unusable_file_path_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"x").unwrap();

    let err = LoggingConfig::default()
        .with_file_logging(blocker.join("app.log"))
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InvalidPath);
    assert_eq!(err.code(), "ERR_INVALID_PATH");
}

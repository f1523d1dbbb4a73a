use unilog_errors::{ExError, ExErrorKind, LoggingError};

#[test]
fn test_invalid_level_verifiable_by_kind() {
    let err = LoggingError::InvalidLevel {
        key: "LOG_LEVEL".to_string(),
        value: "LOUD".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidLevel);
    assert_eq!(ex_err.code(), "ERR_INVALID_LEVEL");
    assert_eq!(ex_err.key(), Some("LOG_LEVEL"));
    assert!(ex_err.message().contains("LOUD"));
}

#[test]
fn test_invalid_path_carries_reason() {
    let err = LoggingError::InvalidPath {
        path: "/dev/null/app.log".to_string(),
        reason: "parent is not a directory".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::InvalidPath);
    assert_eq!(ex_err.op(), Some("open_file_sink"));
    assert_eq!(ex_err.message(), "parent is not a directory");
    assert!(ex_err.kind().is_config());
}

#[test]
fn test_already_installed_distinct_from_config() {
    let ex_err: ExError = LoggingError::AlreadyInstalled {
        target: "log facade".to_string(),
    }
    .into();

    assert_eq!(ex_err.kind(), ExErrorKind::AlreadyInstalled);
    assert!(!ex_err.kind().is_config());
}

#[test]
fn test_invalid_pattern_keeps_the_pattern() {
    let ex_err: ExError = LoggingError::InvalidPattern {
        pattern: "(unclosed".to_string(),
        reason: "unclosed group".to_string(),
    }
    .into();

    assert_eq!(ex_err.code(), "ERR_INVALID_PATTERN");
    assert_eq!(ex_err.key(), Some("(unclosed"));
    assert_eq!(ex_err.op(), Some("compile_rule"));
}

#[test]
fn test_logging_error_display() {
    let err = LoggingError::InvalidBool {
        key: "ENABLE_FILE_LOGGING".to_string(),
        value: "maybe".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Invalid boolean 'maybe' in ENABLE_FILE_LOGGING"
    );
}

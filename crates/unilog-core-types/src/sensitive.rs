//! Sensitive data marker for explicit redaction
//!
//! Key-based redaction only catches values stored under recognizable keys.
//! `Sensitive<T>` lets a caller mark a value as sensitive regardless of the
//! key it is logged under: it redacts itself in Debug, Display and when
//! serialized into a log record's extras.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::schema::REDACTED;

/// Wrapper for sensitive data that redacts itself wherever it is rendered
///
/// # Example
///
/// ```
/// use unilog_core_types::Sensitive;
///
/// let password = Sensitive::new("secret123");
/// assert_eq!(format!("{:?}", password), "REDACTED");
/// assert_eq!(serde_json::to_string(&password).unwrap(), "\"REDACTED\"");
///
/// // Access the actual value when needed
/// assert_eq!(password.expose(), &"secret123");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying sensitive value
    ///
    /// Use this method sparingly and only when the sensitive data
    /// must be accessed (e.g., for authentication).
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> Serialize for Sensitive<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_debug_redaction() {
        let secret = Sensitive::new("my-secret-password");
        let debug_str = format!("{:?}", secret);
        assert_eq!(debug_str, REDACTED);
        assert!(!debug_str.contains("my-secret-password"));
    }

    #[test]
    fn test_sensitive_display_redaction() {
        let secret = Sensitive::new("api-key-12345");
        let display_str = format!("{}", secret);
        assert_eq!(display_str, REDACTED);
        assert!(!display_str.contains("api-key"));
    }

    #[test]
    fn test_sensitive_serializes_as_placeholder() {
        let secret = Sensitive::new(vec![1, 2, 3]);
        let value = serde_json::to_value(&secret).unwrap();
        assert_eq!(value, serde_json::Value::from(REDACTED));
    }

    #[test]
    fn test_sensitive_expose() {
        let secret = Sensitive::new(42);
        assert_eq!(secret.expose(), &42);
    }

    #[test]
    fn test_sensitive_into_inner() {
        let secret = Sensitive::new(String::from("test"));
        let inner = secret.into_inner();
        assert_eq!(inner, "test");
    }

    #[test]
    fn test_sensitive_with_struct() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Session {
            username: String,
            refresh: Sensitive<String>,
        }

        let session = Session {
            username: "alice".to_string(),
            refresh: Sensitive::new("rt-secret123".to_string()),
        };

        let debug_str = format!("{:?}", session);
        assert!(debug_str.contains("alice"));
        assert!(debug_str.contains(REDACTED));
        assert!(!debug_str.contains("rt-secret123"));
    }
}

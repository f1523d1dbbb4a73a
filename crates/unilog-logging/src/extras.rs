//! Typed, ordered key/value extras attached to a log call
//!
//! Values are converted to JSON on insertion. Every value later passes
//! through the redaction engine before it reaches a sink.

use serde::Serialize;
use serde_json::{Map, Value};

/// Stored in place of a value whose `Serialize` impl failed
pub const UNSERIALIZABLE: &str = "<unserializable>";

/// Ordered string-keyed map of extra fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extras {
    fields: Map<String, Value>,
    unserializable: u64,
}

impl Extras {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, replacing any previous value under the same key
    ///
    /// A value that fails to serialize is stored as [`UNSERIALIZABLE`] and
    /// counted; the call itself never fails.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Serialize) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(_) => {
                self.unserializable += 1;
                Value::String(UNSERIALIZABLE.to_string())
            }
        };
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Number of values replaced by the unserializable placeholder
    pub fn unserializable_count(&self) -> u64 {
        self.unserializable
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.fields
    }
}

impl From<Map<String, Value>> for Extras {
    fn from(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            unserializable: 0,
        }
    }
}

impl<K: Into<String>, V: Serialize> FromIterator<(K, V)> for Extras {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut extras = Extras::new();
        for (k, v) in iter {
            extras.insert(k, v);
        }
        extras
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_insertion_order_preserved() {
        let extras = Extras::new().with("b", 1).with("a", "two").with("c", true);
        let keys: Vec<_> = extras.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_unserializable_value_gets_placeholder() {
        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);

        let extras = Extras::new().with("bad", &bad).with("good", 1);
        assert_eq!(extras.get("bad"), Some(&Value::from(UNSERIALIZABLE)));
        assert_eq!(extras.get("good"), Some(&Value::from(1)));
        assert_eq!(extras.unserializable_count(), 1);
    }

    #[test]
    fn test_from_iterator() {
        let extras: Extras = vec![("x", 1), ("y", 2)].into_iter().collect();
        assert_eq!(extras.len(), 2);
        assert!(extras.contains_key("y"));
    }

    #[test]
    fn test_nested_values() {
        let extras = Extras::new().with("user", serde_json::json!({"id": 7, "tags": ["a"]}));
        assert_eq!(extras.get("user").unwrap()["id"], Value::from(7));
    }
}

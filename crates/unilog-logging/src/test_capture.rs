//! In-memory capture sink for deterministic logging assertions
//!
//! Captured output is exactly what a real sink would have written, so tests
//! assert on rendered lines rather than on internal structures.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::format::Format;
use crate::level::Level;
use crate::logger::UnifiedLogger;
use crate::sink::{Destination, SinkConfig, WriteMode};

/// Writer half of a [`TestCapture`]
#[derive(Clone)]
pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .map(|mut b| b.extend_from_slice(buf))
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "capture buffer poisoned"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Handle for reading captured output in tests
#[derive(Clone, Default)]
pub struct TestCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl TestCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writer(&self) -> CaptureWriter {
        CaptureWriter {
            buffer: self.buffer.clone(),
        }
    }

    /// Blocking sink at Debug writing into this capture
    pub fn sink_config(&self, format: Format) -> SinkConfig {
        SinkConfig::new("capture", Destination::Writer(Box::new(self.writer())), format)
            .with_min_level(Level::Debug)
            .with_mode(WriteMode::Blocking)
    }

    /// Logger with a single JSON capture sink and source `test`
    ///
    /// # Panics
    ///
    /// Never in practice: a writer sink has nothing to open.
    pub fn logger(&self) -> UnifiedLogger {
        UnifiedLogger::builder()
            .source("test")
            .sink(self.sink_config(Format::Json))
            .build()
            .expect("capture sink cannot fail to open")
    }

    /// Everything written so far
    pub fn text(&self) -> String {
        self.buffer
            .lock()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
    }

    /// Lines that parse as JSON objects
    pub fn json_records(&self) -> Vec<Value> {
        self.lines()
            .iter()
            .filter_map(|l| serde_json::from_str::<Value>(l).ok())
            .filter(Value::is_object)
            .collect()
    }

    /// Count JSON records matching a predicate
    pub fn count_records<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Value) -> bool,
    {
        self.json_records().iter().filter(|r| predicate(r)).count()
    }

    /// Assert that a record exists with the given `op` and `event` context fields
    ///
    /// # Panics
    ///
    /// Panics if no such record was captured
    pub fn assert_event_exists(&self, op: &str, event: &str) {
        let records = self.json_records();
        let found = records
            .iter()
            .any(|r| r["context"]["op"] == op && r["context"]["event"] == event);
        assert!(
            found,
            "Expected event op={} event={} not found in {} captured records",
            op,
            event,
            records.len()
        );
    }

    /// # Panics
    ///
    /// Panics if no captured line contains `needle`
    pub fn assert_line_contains(&self, needle: &str) {
        let lines = self.lines();
        assert!(
            lines.iter().any(|l| l.contains(needle)),
            "Expected a line containing {:?} in {} captured lines",
            needle,
            lines.len()
        );
    }

    pub fn clear(&self) {
        self.buffer.lock().map(|mut b| b.clear()).ok();
    }
}

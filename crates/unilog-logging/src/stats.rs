//! Internal counters and rate-limited diagnostics
//!
//! The pipeline cannot report its own failures through itself, so failures
//! are counted here and, for redaction fallbacks and ignored context writes,
//! announced on stderr at most once per interval.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default minimum spacing between two internal diagnostics
pub const DEFAULT_DIAGNOSTIC_INTERVAL: Duration = Duration::from_secs(60);

/// Failure counters shared by every component of one pipeline
#[derive(Debug, Default)]
pub struct PipelineStats {
    redaction_fallbacks: AtomicU64,
    unserializable_values: AtomicU64,
    format_placeholders: AtomicU64,
    dropped_records: AtomicU64,
    records_written: AtomicU64,
    unscoped_context_writes: AtomicU64,
    diagnostics: Diagnostics,
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStatsSnapshot {
    pub redaction_fallbacks: u64,
    pub unserializable_values: u64,
    pub format_placeholders: u64,
    pub dropped_records: u64,
    pub records_written: u64,
    pub unscoped_context_writes: u64,
    pub diagnostics_emitted: u64,
    pub diagnostics_suppressed: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats whose diagnostics are rate limited with a custom interval
    pub fn with_diagnostic_interval(interval: Duration) -> Self {
        Self {
            diagnostics: Diagnostics::new(interval),
            ..Self::default()
        }
    }

    /// A redaction pass failed and the unfiltered text was used instead
    pub fn record_redaction_fallback(&self, detail: &str) {
        self.redaction_fallbacks.fetch_add(1, Ordering::Relaxed);
        self.diagnostics
            .emit(&format!("redaction fell back to unfiltered text: {detail}"));
    }

    /// A context write from a tokio task with no task-local slot was ignored
    pub fn record_unscoped_context_write(&self, operation: &str) {
        self.unscoped_context_writes.fetch_add(1, Ordering::Relaxed);
        self.diagnostics.emit(&format!(
            "{operation} ignored: tokio task was not started through context::scope or context::spawn"
        ));
    }

    pub fn record_unserializable(&self) {
        self.unserializable_values.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_format_placeholder(&self) {
        self.format_placeholders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped_records.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_written(&self) {
        self.records_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Last diagnostic that was actually emitted
    pub fn last_diagnostic(&self) -> Option<String> {
        self.diagnostics.last()
    }

    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            redaction_fallbacks: self.redaction_fallbacks.load(Ordering::Relaxed),
            unserializable_values: self.unserializable_values.load(Ordering::Relaxed),
            format_placeholders: self.format_placeholders.load(Ordering::Relaxed),
            dropped_records: self.dropped_records.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            unscoped_context_writes: self.unscoped_context_writes.load(Ordering::Relaxed),
            diagnostics_emitted: self.diagnostics.emitted.load(Ordering::Relaxed),
            diagnostics_suppressed: self.diagnostics.suppressed.load(Ordering::Relaxed),
        }
    }
}

/// Stderr diagnostics, at most one per interval
#[derive(Debug)]
struct Diagnostics {
    interval: Duration,
    state: Mutex<DiagnosticState>,
    emitted: AtomicU64,
    suppressed: AtomicU64,
}

#[derive(Debug, Default)]
struct DiagnosticState {
    last_emit: Option<Instant>,
    last_message: Option<String>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGNOSTIC_INTERVAL)
    }
}

impl Diagnostics {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: Mutex::new(DiagnosticState::default()),
            emitted: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
        }
    }

    fn emit(&self, message: &str) {
        // A poisoned lock means a diagnostic panicked mid-write; skip rather than propagate.
        let Ok(mut state) = self.state.lock() else {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            return;
        };
        let now = Instant::now();
        let due = state
            .last_emit
            .map_or(true, |last| now.duration_since(last) >= self.interval);
        if !due {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            return;
        }
        state.last_emit = Some(now);
        state.last_message = Some(message.to_string());
        self.emitted.fetch_add(1, Ordering::Relaxed);
        eprintln!("[unilog] {message}");
    }

    fn last(&self) -> Option<String> {
        self.state.lock().ok().and_then(|s| s.last_message.clone())
    }
}

//! Output sinks and the registry that fans records out to them
//!
//! Each sink owns a level threshold, a format, an admission predicate and a
//! writer. Queued writers hand whole lines to a `tracing_appender`
//! non-blocking worker thread; blocking writers serialize through a mutex.
//! Either way a record is exactly one write, so lines never interleave.
//!
//! The registry is immutable once built. Write failures are swallowed and
//! counted; nothing here returns an error to the caller of a log method.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use unilog_errors::LoggingError;

use crate::format::Format;
use crate::level::Level;
use crate::record::LogRecord;
use crate::rotation::{RotatingFileWriter, RotationPolicy};
use crate::stats::PipelineStats;

/// Default capacity of a queued sink's channel, in lines
pub const DEFAULT_QUEUE_CAPACITY: usize = 128_000;

/// Module prefixes treated as noisy in production
pub const DEFAULT_NOISY_MODULES: &[&str] = &[
    "hyper",
    "h2",
    "tower_http",
    "reqwest",
    "rustls",
    "sqlx",
    "tungstenite",
    "tokio_tungstenite",
    "fake",
];

/// Where a sink writes
pub enum Destination {
    Stdout,
    Stderr,
    File { path: PathBuf, policy: RotationPolicy },
    Writer(Box<dyn Write + Send>),
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stdout => f.write_str("Stdout"),
            Destination::Stderr => f.write_str("Stderr"),
            Destination::File { path, policy } => f
                .debug_struct("File")
                .field("path", path)
                .field("policy", policy)
                .finish(),
            Destination::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// How writes reach the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Bounded lossy queue drained by a worker thread
    Queued,
    /// Synchronous write under a mutex
    Blocking,
}

/// Environment-aware admission rule, applied before the level threshold
#[derive(Debug, Clone, Default)]
pub struct AdmissionPredicate {
    production: bool,
    noisy_prefixes: Vec<String>,
}

impl AdmissionPredicate {
    pub fn new(environment: &str, noisy_prefixes: &[String]) -> Self {
        Self {
            production: is_production(environment),
            noisy_prefixes: noisy_prefixes.to_vec(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.production
    }

    /// Error and above always pass; in production noisy modules need Warning
    pub fn admits(&self, record: &LogRecord) -> bool {
        let level = record.level();
        if level >= Level::Error {
            return true;
        }
        if self.production && self.is_noisy(&record.display_callsite().module) {
            return level >= Level::Warning;
        }
        true
    }

    fn is_noisy(&self, module: &str) -> bool {
        self.noisy_prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches("::");
            module == prefix
                || module
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with("::"))
        })
    }
}

/// `production` and `prod`, case-insensitive
pub fn is_production(environment: &str) -> bool {
    matches!(
        environment.trim().to_ascii_lowercase().as_str(),
        "production" | "prod"
    )
}

/// Declarative description of one sink
#[derive(Debug)]
pub struct SinkConfig {
    pub name: String,
    pub min_level: Level,
    pub destination: Destination,
    pub format: Format,
    pub mode: Option<WriteMode>,
    pub predicate: Option<AdmissionPredicate>,
    pub queue_capacity: usize,
}

impl SinkConfig {
    pub fn new(name: impl Into<String>, destination: Destination, format: Format) -> Self {
        Self {
            name: name.into(),
            min_level: Level::Info,
            destination,
            format,
            mode: None,
            predicate: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Use this predicate instead of the registry default
    pub fn with_predicate(mut self, predicate: AdmissionPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

/// Swallows write errors from the wrapped writer and counts them
struct CountingWriter<W> {
    inner: W,
    dropped: Arc<AtomicU64>,
    stats: Arc<PipelineStats>,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.write_all(buf) {
            Ok(()) => self.stats.record_written(),
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                self.stats.record_dropped();
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Flush failures surface as dropped records on the next write.
        let _ = self.inner.flush();
        Ok(())
    }
}

type SharedWriter = Arc<Mutex<CountingWriter<Box<dyn Write + Send>>>>;

enum SinkWriter {
    Queued(NonBlocking),
    Blocking(SharedWriter),
}

/// One configured output
pub struct Sink {
    name: String,
    min_level: Level,
    format: Format,
    predicate: AdmissionPredicate,
    writer: SinkWriter,
    dropped: Arc<AtomicU64>,
    stats: Arc<PipelineStats>,
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("name", &self.name)
            .field("min_level", &self.min_level)
            .field("format", &self.format)
            .finish()
    }
}

impl Sink {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_level(&self) -> Level {
        self.min_level
    }

    /// Predicate first, then the level threshold
    pub fn admits(&self, record: &LogRecord) -> bool {
        self.predicate.admits(record) && record.level() >= self.min_level
    }

    /// Records this sink failed to deliver
    pub fn dropped(&self) -> u64 {
        let queue_drops = match &self.writer {
            SinkWriter::Queued(nb) => nb.error_counter().dropped_lines() as u64,
            SinkWriter::Blocking(_) => 0,
        };
        self.dropped.load(Ordering::Relaxed) + queue_drops
    }

    fn write(&self, bytes: &[u8]) {
        match &self.writer {
            SinkWriter::Queued(nb) => {
                let mut nb = nb.clone();
                // Lossy mode reports failures through the error counter, not the result.
                let _ = nb.write(bytes);
            }
            SinkWriter::Blocking(writer) => match writer.lock() {
                Ok(mut w) => {
                    let _ = w.write(bytes);
                    let _ = w.flush();
                }
                Err(_) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    self.stats.record_dropped();
                }
            },
        }
    }
}

/// Outcome of [`SinkRegistry::shutdown`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub drained: Vec<String>,
    pub abandoned: Vec<String>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.abandoned.is_empty()
    }
}

/// Fixed set of sinks
pub struct SinkRegistry {
    sinks: Vec<Sink>,
    guards: Mutex<Vec<(String, WorkerGuard)>>,
    flushers: Vec<(String, SharedWriter)>,
    closed: AtomicBool,
    stats: Arc<PipelineStats>,
}

impl fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("sinks", &self.sinks)
            .field("closed", &self.closed)
            .finish()
    }
}

impl SinkRegistry {
    /// Open every destination; any failure aborts the whole build
    pub fn build(
        configs: Vec<SinkConfig>,
        default_predicate: AdmissionPredicate,
        stats: Arc<PipelineStats>,
    ) -> Result<Self, LoggingError> {
        let mut sinks = Vec::with_capacity(configs.len());
        let mut guards = Vec::new();
        let mut flushers = Vec::new();

        for config in configs {
            let dropped = Arc::new(AtomicU64::new(0));
            let mode = config.mode.unwrap_or(match config.destination {
                Destination::Writer(_) => WriteMode::Blocking,
                _ => WriteMode::Queued,
            });
            let raw: Box<dyn Write + Send> = match config.destination {
                Destination::Stdout => Box::new(io::stdout()),
                Destination::Stderr => Box::new(io::stderr()),
                Destination::File { path, policy } => {
                    Box::new(RotatingFileWriter::open(path, policy)?)
                }
                Destination::Writer(w) => w,
            };
            let counting = CountingWriter {
                inner: raw,
                dropped: dropped.clone(),
                stats: stats.clone(),
            };

            let writer = match mode {
                WriteMode::Queued => {
                    let (nb, guard) = NonBlockingBuilder::default()
                        .lossy(true)
                        .buffered_lines_limit(config.queue_capacity)
                        .thread_name(&format!("unilog-{}", config.name))
                        .finish(counting);
                    guards.push((config.name.clone(), guard));
                    SinkWriter::Queued(nb)
                }
                WriteMode::Blocking => {
                    let shared: SharedWriter = Arc::new(Mutex::new(counting));
                    flushers.push((config.name.clone(), shared.clone()));
                    SinkWriter::Blocking(shared)
                }
            };

            sinks.push(Sink {
                name: config.name,
                min_level: config.min_level,
                format: config.format,
                predicate: config.predicate.unwrap_or_else(|| default_predicate.clone()),
                writer,
                dropped,
                stats: stats.clone(),
            });
        }

        Ok(Self {
            sinks,
            guards: Mutex::new(guards),
            flushers,
            closed: AtomicBool::new(false),
            stats,
        })
    }

    pub fn sinks(&self) -> &[Sink] {
        &self.sinks
    }

    /// Set once shutdown has started
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Render and write the record to every admitting sink
    pub fn dispatch(&self, record: &LogRecord) {
        if self.is_closed() {
            self.stats.record_dropped();
            return;
        }
        for sink in &self.sinks {
            if sink.admits(record) {
                let bytes = sink.format.render(record, &self.stats);
                sink.write(&bytes);
            }
        }
    }

    /// Total records dropped by sinks, including queue overflow
    pub fn dropped(&self) -> u64 {
        self.sinks.iter().map(Sink::dropped).sum()
    }

    /// Records lost to queue overflow or closed channels
    pub(crate) fn queue_drops(&self) -> u64 {
        self.sinks
            .iter()
            .map(|s| match &s.writer {
                SinkWriter::Queued(nb) => nb.error_counter().dropped_lines() as u64,
                SinkWriter::Blocking(_) => 0,
            })
            .sum()
    }

    /// Drain every writer, giving up on the ones still busy at the deadline
    ///
    /// Each writer drains on its own helper thread; writers that miss the
    /// deadline are left running detached and reported as abandoned.
    pub fn shutdown(&self, timeout: Duration) -> ShutdownReport {
        self.closed.store(true, Ordering::Release);

        let guards = match self.guards.lock() {
            Ok(mut guards) => std::mem::take(&mut *guards),
            Err(_) => Vec::new(),
        };

        let (tx, rx) = mpsc::channel::<String>();
        let mut pending: Vec<String> = Vec::new();

        for (name, guard) in guards {
            let tx = tx.clone();
            pending.push(name.clone());
            thread::spawn(move || {
                drop(guard);
                let _ = tx.send(name);
            });
        }
        for (name, writer) in &self.flushers {
            let tx = tx.clone();
            let writer = writer.clone();
            let name = name.clone();
            pending.push(name.clone());
            thread::spawn(move || {
                if let Ok(mut w) = writer.lock() {
                    let _ = w.flush();
                }
                let _ = tx.send(name);
            });
        }
        drop(tx);

        let deadline = Instant::now() + timeout;
        let mut report = ShutdownReport::default();
        while !pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(name) => {
                    if let Some(pos) = pending.iter().position(|p| *p == name) {
                        pending.remove(pos);
                    }
                    report.drained.push(name);
                }
                Err(_) => break,
            }
        }
        report.abandoned = pending;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CallSite;

    fn record(level: Level, module: &str) -> LogRecord {
        LogRecord::new(level, "m", CallSite::new(module, None, Some(1)), "test")
    }

    fn noisy() -> Vec<String> {
        vec!["sqlx".to_string(), "hyper".to_string()]
    }

    #[test]
    fn test_production_noisy_module_needs_warning() {
        let p = AdmissionPredicate::new("production", &noisy());
        assert!(!p.admits(&record(Level::Info, "sqlx::query")));
        assert!(p.admits(&record(Level::Warning, "sqlx::query")));
        assert!(p.admits(&record(Level::Error, "sqlx::query")));
        assert!(p.admits(&record(Level::Info, "chat::session")));
    }

    #[test]
    fn test_development_admits_everything() {
        let p = AdmissionPredicate::new("development", &noisy());
        assert!(p.admits(&record(Level::Debug, "sqlx::query")));
    }

    #[test]
    fn test_prefix_match_is_segment_aware() {
        let p = AdmissionPredicate::new("prod", &noisy());
        assert!(!p.admits(&record(Level::Info, "hyper")));
        assert!(p.admits(&record(Level::Info, "hyperlink::parse")));
    }

    #[test]
    fn test_override_module_is_used() {
        let p = AdmissionPredicate::new("production", &noisy());
        let rec = record(Level::Info, "bridge")
            .with_caller_override(CallSite::new("hyper::proto::h1", None, None));
        assert!(!p.admits(&rec));
    }

    #[test]
    fn test_is_production() {
        assert!(is_production("Production"));
        assert!(is_production(" prod "));
        assert!(!is_production("staging"));
    }

    struct FailingWriter;
    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_errors_are_counted_not_raised() {
        let stats = Arc::new(PipelineStats::new());
        let registry = SinkRegistry::build(
            vec![SinkConfig::new(
                "broken",
                Destination::Writer(Box::new(FailingWriter)),
                Format::Json,
            )],
            AdmissionPredicate::default(),
            stats.clone(),
        )
        .unwrap();

        registry.dispatch(&record(Level::Error, "app"));
        registry.dispatch(&record(Level::Error, "app"));

        assert_eq!(registry.dropped(), 2);
        assert_eq!(stats.snapshot().dropped_records, 2);
    }

    struct PanickingWriter;
    impl Write for PanickingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            panic!("writer bug");
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_poisoned_writer_counts_in_pipeline_stats() {
        let stats = Arc::new(PipelineStats::new());
        let registry = SinkRegistry::build(
            vec![SinkConfig::new(
                "poisoned",
                Destination::Writer(Box::new(PanickingWriter)),
                Format::Json,
            )],
            AdmissionPredicate::default(),
            stats.clone(),
        )
        .unwrap();

        let first = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            registry.dispatch(&record(Level::Error, "app"));
        }));
        assert!(first.is_err());

        registry.dispatch(&record(Level::Error, "app"));
        registry.dispatch(&record(Level::Error, "app"));

        assert_eq!(registry.dropped(), 2);
        assert_eq!(stats.snapshot().dropped_records, 2);
    }

    #[test]
    fn test_shutdown_drains_queued_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let stats = Arc::new(PipelineStats::new());
        let registry = SinkRegistry::build(
            vec![SinkConfig::new(
                "file",
                Destination::File {
                    path: path.clone(),
                    policy: RotationPolicy::default(),
                },
                Format::Json,
            )],
            AdmissionPredicate::default(),
            stats,
        )
        .unwrap();

        for _ in 0..10 {
            registry.dispatch(&record(Level::Info, "app"));
        }
        let report = registry.shutdown(Duration::from_secs(5));
        assert!(report.is_clean());
        assert_eq!(report.drained, vec!["file".to_string()]);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 10);
    }

    #[test]
    fn test_dispatch_after_shutdown_is_dropped() {
        let stats = Arc::new(PipelineStats::new());
        let registry = SinkRegistry::build(
            vec![SinkConfig::new(
                "mem",
                Destination::Writer(Box::new(io::sink())),
                Format::Json,
            )],
            AdmissionPredicate::default(),
            stats.clone(),
        )
        .unwrap();
        registry.shutdown(Duration::from_secs(1));
        registry.dispatch(&record(Level::Error, "app"));
        assert_eq!(stats.snapshot().dropped_records, 1);
    }

    struct SlowFlush;
    impl Write for SlowFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            thread::sleep(Duration::from_secs(2));
            Ok(())
        }
    }

    #[test]
    fn test_shutdown_abandons_slow_writer() {
        let registry = SinkRegistry::build(
            vec![SinkConfig::new(
                "slow",
                Destination::Writer(Box::new(SlowFlush)),
                Format::Json,
            )],
            AdmissionPredicate::default(),
            Arc::new(PipelineStats::new()),
        )
        .unwrap();

        let started = Instant::now();
        let report = registry.shutdown(Duration::from_millis(100));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(report.abandoned, vec!["slow".to_string()]);
    }
}

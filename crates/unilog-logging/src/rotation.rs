//! Size-rotated log file with age-based retention and gzip compression
//!
//! `app.log` grows until the next write would push it past `max_bytes`; it is
//! then renamed to `app.<timestamp>.log`. Compression to
//! `app.<timestamp>.log.gz` and deletion of rotated files older than the
//! retention window run on a housekeeping thread so the write path only pays
//! for the rename. Each `write` call is written whole to one file, so a record
//! never straddles a rotation.
//!
//! Retention only ever touches files whose names have the exact rotated shape
//! `<stem>.<timestamp>[.<ext>][.gz]`; other siblings are left alone.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

use chrono::{NaiveDateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use unilog_errors::LoggingError;

pub const DEFAULT_MAX_BYTES: u64 = 100 * 1024 * 1024;
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const STAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6f";

/// When to rotate and what to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub retention: Duration,
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            retention: DEFAULT_RETENTION,
            compress: true,
        }
    }
}

/// Appending file writer that rotates by size
#[derive(Debug)]
pub struct RotatingFileWriter {
    path: PathBuf,
    policy: RotationPolicy,
    file: File,
    written: u64,
    housekeeping: Option<JoinHandle<io::Result<()>>>,
}

impl RotatingFileWriter {
    /// Open (or create) the active file, creating parent directories
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> Result<Self, LoggingError> {
        let path = path.into();
        let invalid = |reason: String| LoggingError::InvalidPath {
            path: path.display().to_string(),
            reason,
        };

        if path.as_os_str().is_empty() {
            return Err(invalid("path is empty".to_string()));
        }
        if path.is_dir() {
            return Err(invalid("path is a directory".to_string()));
        }
        if path.file_name().is_none() {
            return Err(invalid("path has no file name".to_string()));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| invalid(format!("cannot create directory: {e}")))?;
        }

        let file = open_append(&path).map_err(|e| invalid(format!("cannot open: {e}")))?;
        let written = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            path,
            policy,
            file,
            written,
            housekeeping: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes in the active file
    pub fn current_size(&self) -> u64 {
        self.written
    }

    /// Wait for the pending compression and retention pass, if any
    ///
    /// # Errors
    ///
    /// Returns the I/O error the housekeeping pass hit.
    pub fn finish_housekeeping(&mut self) -> io::Result<()> {
        match self.housekeeping.take() {
            Some(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("rotation housekeeping panicked"))),
            None => Ok(()),
        }
    }

    fn rotate(&mut self) -> io::Result<()> {
        // A failed pass from the previous rotation surfaces here, on the write
        // that would start the next one.
        self.finish_housekeeping()?;
        self.file.flush()?;

        let rotated = self.rotated_path();
        fs::rename(&self.path, &rotated)?;
        match open_append(&self.path) {
            Ok(file) => self.file = file,
            Err(e) => {
                // The old handle still points at the renamed file; put it back.
                fs::rename(&rotated, &self.path)?;
                return Err(e);
            }
        }
        self.written = 0;

        let active = self.path.clone();
        let policy = self.policy;
        let handle = thread::Builder::new()
            .name("unilog-rotate".to_string())
            .spawn(move || housekeep(&active, &rotated, policy))?;
        self.housekeeping = Some(handle);
        Ok(())
    }

    fn rotated_path(&self) -> PathBuf {
        let stamp = Utc::now().format(STAMP_FORMAT);
        let name = match self.path.extension() {
            Some(ext) => format!("{}.{stamp}.{}", stem(&self.path), ext.to_string_lossy()),
            None => format!("{}.{stamp}", stem(&self.path)),
        };
        self.path.with_file_name(name)
    }

    /// Rotated siblings of the active file
    pub fn rotated_files(&self) -> io::Result<Vec<PathBuf>> {
        rotated_siblings(&self.path)
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.policy.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl Drop for RotatingFileWriter {
    fn drop(&mut self) {
        let _ = self.finish_housekeeping();
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether `name` is a file this writer produced when rotating `active`
fn is_rotated_name(active: &Path, name: &str) -> bool {
    let Some(rest) = name.strip_prefix(&format!("{}.", stem(active))) else {
        return false;
    };
    let rest = rest.strip_suffix(".gz").unwrap_or(rest);
    let stamp = match active.extension() {
        Some(ext) => match rest.strip_suffix(&format!(".{}", ext.to_string_lossy())) {
            Some(stamp) => stamp,
            None => return false,
        },
        None => rest,
    };
    NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).is_ok()
}

fn rotated_siblings(active: &Path) -> io::Result<Vec<PathBuf>> {
    let dir = match active.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("."),
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if is_rotated_name(active, &name.to_string_lossy()) && entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn housekeep(active: &Path, rotated: &Path, policy: RotationPolicy) -> io::Result<()> {
    if policy.compress {
        compress(rotated)?;
    }
    prune(active, policy.retention)
}

fn prune(active: &Path, retention: Duration) -> io::Result<()> {
    let now = SystemTime::now();
    for path in rotated_siblings(active)? {
        let modified = fs::metadata(&path)?.modified()?;
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age >= retention {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn compress(path: &Path) -> io::Result<()> {
    let mut gz_name = path.as_os_str().to_os_string();
    gz_name.push(".gz");
    let mut input = BufReader::new(File::open(path)?);
    let mut encoder = GzEncoder::new(File::create(PathBuf::from(gz_name))?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()?;
    fs::remove_file(path)
}

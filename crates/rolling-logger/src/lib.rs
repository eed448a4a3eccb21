//! Rolling File Logger
//!
//! Formats `tracing` events (and `log` records, bridged by the subscriber)
//! into `<dir>/<app_name>.log`. The file is rotated by size into
//! `<app_name>.1.log`, `<app_name>.2.log`, ... and the newest lines are kept
//! in a circular buffer so an app can show recent logs without reading disk.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;

/// Rotate once the active file would grow past this many bytes
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;
/// Number of rotated files kept next to the active one
pub const DEFAULT_MAX_BACKUPS: usize = 3;
/// Lines kept in memory
pub const DEFAULT_BUFFER_LINES: usize = 500;

static WRITER: OnceLock<RollingWriter> = OnceLock::new();

#[derive(Debug)]
pub enum LoggerError {
    Io(io::Error),
    AlreadyInitialized,
    NotInitialized,
    Subscriber(String),
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerError::Io(e) => write!(f, "log file error: {}", e),
            LoggerError::AlreadyInitialized => write!(f, "logger already initialized"),
            LoggerError::NotInitialized => write!(f, "logger not initialized"),
            LoggerError::Subscriber(msg) => write!(f, "failed to install subscriber: {}", msg),
        }
    }
}

impl std::error::Error for LoggerError {}

impl From<io::Error> for LoggerError {
    fn from(e: io::Error) -> Self {
        LoggerError::Io(e)
    }
}

// ========================
// Rolling file
// ========================

struct RollingFile {
    dir: PathBuf,
    app_name: String,
    max_bytes: u64,
    max_backups: usize,
    file: File,
    written: u64,
}

impl RollingFile {
    fn open(dir: &Path, app_name: &str, max_bytes: u64, max_backups: usize) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.log", app_name));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            app_name: app_name.to_string(),
            max_bytes,
            max_backups,
            file,
            written,
        })
    }

    fn path_for(&self, index: usize) -> PathBuf {
        if index == 0 {
            self.dir.join(format!("{}.log", self.app_name))
        } else {
            self.dir.join(format!("{}.{}.log", self.app_name, index))
        }
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.max_backups == 0 {
            self.file = File::create(self.path_for(0))?;
            self.written = 0;
            return Ok(());
        }

        let oldest = self.path_for(self.max_backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (0..self.max_backups).rev() {
            let from = self.path_for(index);
            if from.exists() {
                fs::rename(&from, self.path_for(index + 1))?;
            }
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.path_for(0))?;
        self.written = 0;
        Ok(())
    }

    fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        let len = buf.len() as u64;
        if self.written > 0 && self.written + len > self.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(buf)?;
        self.written += len;
        Ok(())
    }
}

// ========================
// Circular line buffer
// ========================

struct LineBuffer {
    lines: VecDeque<String>,
    capacity: usize,
    partial: String,
}

impl LineBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            partial: String::new(),
        }
    }

    fn push_bytes(&mut self, buf: &[u8]) {
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            self.push_line(line.trim_end().to_string());
        }
    }

    fn push_line(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }
}

// ========================
// Writer
// ========================

struct Shared {
    file: Mutex<RollingFile>,
    buffer: Mutex<LineBuffer>,
}

/// Cloneable sink shared by every formatted event
#[derive(Clone)]
pub struct RollingWriter {
    shared: Arc<Shared>,
}

impl RollingWriter {
    pub fn new(dir: impl AsRef<Path>, app_name: &str) -> io::Result<Self> {
        Self::with_limits(
            dir,
            app_name,
            DEFAULT_MAX_BYTES,
            DEFAULT_MAX_BACKUPS,
            DEFAULT_BUFFER_LINES,
        )
    }

    pub fn with_limits(
        dir: impl AsRef<Path>,
        app_name: &str,
        max_bytes: u64,
        max_backups: usize,
        buffer_lines: usize,
    ) -> io::Result<Self> {
        let file = RollingFile::open(dir.as_ref(), app_name, max_bytes, max_backups)?;
        Ok(Self {
            shared: Arc::new(Shared {
                file: Mutex::new(file),
                buffer: Mutex::new(LineBuffer::new(buffer_lines)),
            }),
        })
    }

    /// Newest lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        match self.shared.buffer.lock() {
            Ok(buffer) => buffer.lines.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Path of the file currently being written
    pub fn active_path(&self) -> Option<PathBuf> {
        self.shared.file.lock().ok().map(|file| file.path_for(0))
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        {
            let mut file = self
                .shared
                .file
                .lock()
                .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
            file.append(buf)?;
        }
        if let Ok(mut buffer) = self.shared.buffer.lock() {
            buffer.push_bytes(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self
            .shared
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        file.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Local wall-clock timestamps with millisecond precision
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

// ========================
// Global logger
// ========================

/// Install the global subscriber writing to `<log_dir>/<app_name>.log`.
///
/// `log` macros used by dependent crates are routed through the same
/// subscriber.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    if WRITER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let writer = RollingWriter::new(log_dir, app_name)?;

    // Only a writer whose subscriber was installed becomes the global one
    tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_ansi(false)
        .with_timer(LocalTimer)
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .map_err(|e| LoggerError::Subscriber(e.to_string()))?;

    WRITER
        .set(writer)
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    log::info!("{} logger started", app_name);
    Ok(())
}

pub fn info(msg: &str) -> Result<(), LoggerError> {
    if WRITER.get().is_none() {
        return Err(LoggerError::NotInitialized);
    }
    tracing::info!(target: "rolling_logger", "{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), LoggerError> {
    if WRITER.get().is_none() {
        return Err(LoggerError::NotInitialized);
    }
    tracing::error!(target: "rolling_logger", "{}", msg);
    Ok(())
}

/// Newest lines of the global logger; empty before `init_logger`
pub fn recent_lines() -> Vec<String> {
    WRITER.get().map(|w| w.recent_lines()).unwrap_or_default()
}

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Severity of a pipeline log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// A single line emitted by the pipeline for its consumers.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

/// Destination for pipeline log entries.
///
/// The pipeline holds an `Arc<dyn LogSink>` and appends entries for every
/// observable outcome (observer started/stopped, files included, archive
/// written, collision, failure). Consumers decide how to present them.
pub trait LogSink: Send + Sync {
    fn append(&self, entry: LogEntry);
}

// `info`/`error` take `impl Into<String>`, so they cannot live on the
// object-safe `LogSink` trait. A blanket extension trait over `T: LogSink +
// ?Sized` gives both concrete sinks and `dyn LogSink` the same convenience
// methods with one definition (no inherent/trait name collision).
pub trait LogSinkExt {
    fn info(&self, message: impl Into<String>);
    fn error(&self, message: impl Into<String>);
}

impl<T: LogSink + ?Sized> LogSinkExt for T {
    fn info(&self, message: impl Into<String>) {
        self.append(LogEntry::new(Level::Info, message));
    }

    fn error(&self, message: impl Into<String>) {
        self.append(LogEntry::new(Level::Error, message));
    }
}

/// Forwards entries to the `tracing` subscriber. The daemon's default sink.
#[derive(Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn append(&self, entry: LogEntry) {
        match entry.level {
            Level::Info => tracing::info!("{}", entry.message),
            Level::Error => tracing::error!("{}", entry.message),
        }
    }
}

/// Buffers entries in memory. Used by tests and embedding front ends that
/// render the log themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().expect("sink lock poisoned").clone()
    }

    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn append(&self, entry: LogEntry) {
        self.entries.lock().expect("sink lock poisoned").push(entry);
    }
}

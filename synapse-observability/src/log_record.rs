//! Structured log records with correlation/trace ids, and the pluggable
//! sink they're written through. Implements the "event-emitter style
//! observability" redesign note: callers build a [`LogRecord`] and hand it
//! to a [`LogSink`] rather than reaching for a global logger macro.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a [`LogRecord`], ordered low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// One structured log entry. `correlation_id` ties together all records
/// emitted while handling one logical operation (a gossip round, a sync
/// write); `trace_id` ties together one hop of that operation across
/// process boundaries when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub correlation_id: Uuid,
    pub trace_id: Option<Uuid>,
    pub fields: serde_json::Value,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>, correlation_id: Uuid) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            correlation_id,
            trace_id: None,
            fields: serde_json::Value::Null,
        }
    }

    pub fn with_trace_id(mut self, trace_id: Uuid) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_fields(mut self, fields: serde_json::Value) -> Self {
        self.fields = fields;
        self
    }
}

/// Where [`LogRecord`]s go. Implementations must never panic on a
/// malformed record — best-effort delivery only.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &LogRecord);
}

/// Forwards every record into `tracing`'s active subscriber, preserving
/// level and attaching `correlation_id`/`trace_id` as structured fields.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn emit(&self, record: &LogRecord) {
        match record.level {
            Level::Debug => tracing::debug!(
                correlation_id = %record.correlation_id,
                trace_id = ?record.trace_id,
                fields = %record.fields,
                "{}", record.message
            ),
            Level::Info => tracing::info!(
                correlation_id = %record.correlation_id,
                trace_id = ?record.trace_id,
                fields = %record.fields,
                "{}", record.message
            ),
            Level::Warn => tracing::warn!(
                correlation_id = %record.correlation_id,
                trace_id = ?record.trace_id,
                fields = %record.fields,
                "{}", record.message
            ),
            Level::Error => tracing::error!(
                correlation_id = %record.correlation_id,
                trace_id = ?record.trace_id,
                fields = %record.fields,
                "{}", record.message
            ),
        }
    }
}

/// Appends one JSON line per record to a file, for durable audit trails.
pub struct FileSink {
    file: parking_lot::Mutex<std::fs::File>,
}

impl FileSink {
    pub fn open(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file: parking_lot::Mutex::new(file) })
    }
}

impl LogSink for FileSink {
    fn emit(&self, record: &LogRecord) {
        use std::io::Write;
        let Ok(line) = serde_json::to_string(record) else { return };
        let mut file = self.file.lock();
        let _ = writeln!(file, "{line}");
    }
}

/// Buffers every record in memory, for assertions in tests.
#[derive(Debug, Default)]
pub struct InMemorySink {
    records: parking_lot::Mutex<Vec<LogRecord>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl LogSink for InMemorySink {
    fn emit(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }
}

// ABOUTME: Logging capability handed explicitly to the error interceptor.
// ABOUTME: TracingLog forwards to tracing; RecordingLog captures entries for tests.

use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::normalize::{NormalizedError, Severity};

/// Metadata attached to every failure log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogMeta {
    pub request_id: Option<String>,
    pub code: String,
    pub status: u16,
    pub context: Map<String, Value>,
}

impl LogMeta {
    pub fn from_error(request_id: Option<String>, error: &NormalizedError) -> Self {
        Self {
            request_id,
            code: error.code.clone(),
            status: error.status,
            context: error.context.clone(),
        }
    }
}

/// Sink for failure log entries.
///
/// Methods return nothing: a sink that cannot deliver an entry must drop it
/// rather than affect the response being written.
pub trait FailureLog: Send + Sync {
    fn warn(&self, message: &str, meta: &LogMeta);
    fn error(&self, message: &str, meta: &LogMeta);
}

/// Route an entry to the sink method matching its severity.
pub fn log_failure(log: &dyn FailureLog, severity: Severity, message: &str, meta: &LogMeta) {
    match severity {
        Severity::Warn => log.warn(message, meta),
        Severity::Error => log.error(message, meta),
    }
}

/// Production sink backed by `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl FailureLog for TracingLog {
    fn warn(&self, message: &str, meta: &LogMeta) {
        let context = Value::Object(meta.context.clone());
        tracing::warn!(
            request_id = meta.request_id.as_deref().unwrap_or("-"),
            code = %meta.code,
            status = meta.status,
            context = %context,
            "{}",
            message
        );
    }

    fn error(&self, message: &str, meta: &LogMeta) {
        let context = Value::Object(meta.context.clone());
        tracing::error!(
            request_id = meta.request_id.as_deref().unwrap_or("-"),
            code = %meta.code,
            status = meta.status,
            context = %context,
            "{}",
            message
        );
    }
}

/// One captured entry from a [`RecordingLog`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
    pub meta: LogMeta,
}

/// In-memory sink that keeps every entry, for asserting on log behavior.
#[derive(Debug, Default)]
pub struct RecordingLog {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything logged so far.
    pub fn records(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, severity: Severity, message: &str, meta: &LogMeta) {
        let record = LogRecord {
            severity,
            message: message.to_string(),
            meta: meta.clone(),
        };
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

impl FailureLog for RecordingLog {
    fn warn(&self, message: &str, meta: &LogMeta) {
        self.push(Severity::Warn, message, meta);
    }

    fn error(&self, message: &str, meta: &LogMeta) {
        self.push(Severity::Error, message, meta);
    }
}

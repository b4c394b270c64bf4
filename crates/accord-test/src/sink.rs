//! In-memory log capture.

use accord_telemetry::{LogLevel, LogRecord, LogSink};
use parking_lot::Mutex;
use std::sync::Arc;

/// A [`LogSink`] that keeps every record in memory.
///
/// Clones share the same buffer.
///
/// ```
/// use accord_telemetry::Logger;
/// use accord_test::MemorySink;
/// use serde_json::json;
///
/// let sink = MemorySink::new();
/// let logger = Logger::new().with_sink(sink.clone());
/// logger.error("boom", json!({"endpoint": "getUser"}));
/// assert_eq!(sink.messages(), ["boom"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the captured records.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Returns the captured records at `level`.
    #[must_use]
    pub fn at_level(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.level == level)
            .cloned()
            .collect()
    }

    /// Returns the captured messages.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }

    /// Returns the number of captured records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drops every captured record.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn log(&self, record: &LogRecord) {
        self.records.lock().push(record.clone());
    }
}

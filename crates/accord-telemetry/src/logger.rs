//! The logging collaborator.
//!
//! A [`Logger`] is constructed explicitly by the host application and handed
//! to the components that report failures. It multiplexes every record to
//! zero or more [`LogSink`]s. Sinks can be added at any time but never
//! removed; a fresh `Logger` starts with none.
//!
//! # Example
//!
//! ```
//! use accord_telemetry::{LogLevel, Logger, TracingSink};
//! use serde_json::json;
//!
//! let logger = Logger::new().with_sink(TracingSink);
//! logger.log(
//!     LogLevel::Error,
//!     "request failed",
//!     Some(json!({"endpoint": "getUser"})),
//! );
//! assert_eq!(logger.sink_count(), 1);
//! ```

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Very fine-grained diagnostics.
    Trace,
    /// Debugging information.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected that was handled.
    Warn,
    /// A failure.
    Error,
}

impl LogLevel {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level `{other}`")),
        }
    }
}

/// One log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Structured metadata.
    pub metadata: Map<String, Value>,
    /// When the record was created.
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Returns a metadata field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.metadata.get(name)
    }
}

/// Destination for log records.
pub trait LogSink: Send + Sync {
    /// Receives one record. Must not block for long.
    fn log(&self, record: &LogRecord);
}

impl<F> LogSink for F
where
    F: Fn(&LogRecord) + Send + Sync,
{
    fn log(&self, record: &LogRecord) {
        self(record);
    }
}

/// Forwards records to `tracing` at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, record: &LogRecord) {
        let metadata = Value::Object(record.metadata.clone());
        let message = record.message.as_str();
        match record.level {
            LogLevel::Trace => tracing::trace!(metadata = %metadata, "{message}"),
            LogLevel::Debug => tracing::debug!(metadata = %metadata, "{message}"),
            LogLevel::Info => tracing::info!(metadata = %metadata, "{message}"),
            LogLevel::Warn => tracing::warn!(metadata = %metadata, "{message}"),
            LogLevel::Error => tracing::error!(metadata = %metadata, "{message}"),
        }
    }
}

/// Multiplexes records to registered sinks.
///
/// Clones share the same sink registry.
#[derive(Clone, Default)]
pub struct Logger {
    sinks: Arc<RwLock<Vec<Arc<dyn LogSink>>>>,
}

impl Logger {
    /// A logger with no sinks; records are dropped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A logger that forwards to `tracing`.
    #[must_use]
    pub fn tracing() -> Self {
        Self::new().with_sink(TracingSink)
    }

    /// Adds a sink and returns the logger.
    #[must_use]
    pub fn with_sink(self, sink: impl LogSink + 'static) -> Self {
        self.add_sink(Arc::new(sink));
        self
    }

    /// Registers a sink. Sinks are never removed.
    pub fn add_sink(&self, sink: Arc<dyn LogSink>) {
        self.sinks.write().push(sink);
    }

    /// Returns the number of registered sinks.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.read().len()
    }

    /// Emits a record to every sink.
    ///
    /// Object metadata is used as-is; any other value is stored under
    /// `value`.
    pub fn log(&self, level: LogLevel, message: impl Into<String>, metadata: Option<Value>) {
        let sinks = self.sinks.read();
        if sinks.is_empty() {
            return;
        }

        let metadata = match metadata {
            Some(Value::Object(map)) => map,
            Some(other) => Map::from_iter([("value".to_string(), other)]),
            None => Map::new(),
        };
        let record = LogRecord {
            level,
            message: message.into(),
            metadata,
            timestamp: Utc::now(),
        };
        for sink in sinks.iter() {
            sink.log(&record);
        }
    }

    /// Emits an error record.
    pub fn error(&self, message: impl Into<String>, metadata: Value) {
        self.log(LogLevel::Error, message, Some(metadata));
    }

    /// Emits a warning record.
    pub fn warn(&self, message: impl Into<String>, metadata: Value) {
        self.log(LogLevel::Warn, message, Some(metadata));
    }

    /// Emits an info record.
    pub fn info(&self, message: impl Into<String>, metadata: Value) {
        self.log(LogLevel::Info, message, Some(metadata));
    }

    /// Emits a debug record.
    pub fn debug(&self, message: impl Into<String>, metadata: Value) {
        self.log(LogLevel::Debug, message, Some(metadata));
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("sinks", &self.sink_count())
            .finish()
    }
}

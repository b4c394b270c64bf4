//! # Accord Telemetry
//!
//! Logging for Accord clients.
//!
//! - [`Logger`]: the explicitly constructed logging collaborator. Components
//!   that report failures take a `Logger`; the host application decides
//!   which [`LogSink`]s it feeds.
//! - [`TracingSink`]: forwards records to `tracing`.
//! - [`init_logging`]: installs a `tracing-subscriber` with JSON or pretty
//!   output.
//!
//! # Example
//!
//! ```
//! use accord_telemetry::{LogLevel, LogRecord, Logger};
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let logger = Logger::new().with_sink(move |record: &LogRecord| {
//!     sink.lock().unwrap().push(record.message.clone());
//! });
//!
//! logger.log(LogLevel::Info, "ready", None);
//! assert_eq!(seen.lock().unwrap().as_slice(), ["ready"]);
//! ```

#![doc(html_root_url = "https://docs.rs/accord-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logger;
pub mod logging;

pub use error::TelemetryError;
pub use logger::{LogLevel, LogRecord, LogSink, Logger, TracingSink};
pub use logging::{create_env_filter, fields, init_logging, LogConfig};

/// Result type for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

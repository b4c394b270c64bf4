//! `tracing-subscriber` setup.
//!
//! Accord components emit `tracing` events; the host application decides
//! where they go. [`init_logging`] installs a global subscriber with either
//! JSON or human-readable output.
//!
//! # Example
//!
//! ```rust,ignore
//! use accord_telemetry::logging::{LogConfig, init_logging};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(endpoint = "getUser", "calling");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Subscriber settings for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Install nothing when false.
    pub enabled: bool,

    /// `EnvFilter` directive, e.g. `info` or `accord_transport=debug,warn`.
    pub level: String,

    /// One JSON object per event instead of multi-line pretty output.
    pub json: bool,

    /// Emit an event when a call span opens and closes.
    pub span_lifecycle: bool,

    /// Record the source file and line of each event.
    pub source_location: bool,

    /// Record the module path of each event.
    pub targets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl LogConfig {
    /// Pretty output at debug level with span lifecycle and source locations.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json: false,
            span_lifecycle: true,
            source_location: true,
            targets: true,
        }
    }

    /// JSON output at info level.
    #[must_use]
    pub fn production() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json: true,
            span_lifecycle: false,
            source_location: false,
            targets: true,
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_lifecycle {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Installs the global `tracing` subscriber.
///
/// Does nothing when `config.enabled` is false.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidConfig`] if the filter is invalid and
/// [`TelemetryError::LoggingInit`] if a global subscriber is already
/// installed.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let layer = tracing_subscriber::fmt::layer()
        .with_span_events(config.span_events())
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_target(config.targets);
    let output: Box<dyn Layer<Registry> + Send + Sync> = if config.json {
        layer.json().boxed()
    } else {
        layer.pretty().boxed()
    };

    tracing_subscriber::registry()
        .with(output.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parses a filter directive.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidConfig`] if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter)
        .map_err(|e| TelemetryError::InvalidConfig(format!("invalid log level `{filter}`: {e}")))
}

/// Standard field names used in Accord log events and records.
pub mod fields {
    /// Request ID.
    pub const REQUEST_ID: &str = "request_id";

    /// Endpoint name.
    pub const ENDPOINT: &str = "endpoint";

    /// HTTP method.
    pub const HTTP_METHOD: &str = "http.method";

    /// Request URL.
    pub const HTTP_URL: &str = "http.url";

    /// HTTP status code.
    pub const HTTP_STATUS: &str = "http.status_code";

    /// Duration in milliseconds.
    pub const DURATION_MS: &str = "duration_ms";

    /// The error value.
    pub const ERROR: &str = "error";

    /// The error kind discriminator.
    pub const ERROR_KIND: &str = "error_kind";

    /// Human-readable message.
    pub const MESSAGE: &str = "message";

    /// The call input.
    pub const INPUT: &str = "input";

    /// Validation verdict.
    pub const VERDICT: &str = "verdict";
}

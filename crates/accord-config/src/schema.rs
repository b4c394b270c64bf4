//! Configuration sections.

use accord_telemetry::LogConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Client configuration section.
///
/// # Example
///
/// ```
/// use accord_config::ClientConfig;
///
/// let config = ClientConfig {
///     base_url: "https://api.example.com".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.request_id_header, "x-request-id");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Absolute base URL every endpoint path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `User-Agent` sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Header carrying the request id.
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,

    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Headers sent with every request.
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_id_header: default_request_id_header(),
            connect_timeout_ms: default_connect_timeout(),
            default_headers: BTreeMap::new(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_user_agent() -> String {
    concat!("accord/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_request_id_header() -> String {
    "x-request-id".to_string()
}

fn default_connect_timeout() -> u64 {
    10_000
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Structured JSON lines.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a `tracing` subscriber at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `accord_transport=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
        }
    }
}

impl LoggingConfig {
    /// Converts to the subscriber settings used by
    /// [`init_logging`](accord_telemetry::init_logging).
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        let mut config = match self.format {
            LogFormat::Json => LogConfig::production(),
            LogFormat::Pretty => LogConfig::development(),
        };
        config.enabled = self.enabled;
        config.level.clone_from(&self.level);
        config
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert!(config.user_agent.starts_with("accord/"));
        assert_eq!(config.connect_timeout_ms, 10_000);
        assert!(config.default_headers.is_empty());
    }

    #[test]
    fn test_client_rejects_unknown_fields() {
        let result: Result<ClientConfig, _> =
            serde_json::from_str(r#"{"base_url": "https://a.test", "retries": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_log_format_serde() {
        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), r#""json""#);
    }

    #[test]
    fn test_to_log_config() {
        let logging = LoggingConfig {
            enabled: false,
            level: "accord_transport=debug".to_string(),
            format: LogFormat::Pretty,
        };
        let config = logging.to_log_config();
        assert!(!config.enabled);
        assert!(!config.json);
        assert_eq!(config.level, "accord_transport=debug");
    }
}

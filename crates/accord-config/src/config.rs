//! The root configuration type.

use crate::{ClientConfig, ConfigError, LogFormat, LoggingConfig};
use accord_telemetry::create_env_filter;
use http::header::{HeaderName, HeaderValue};
use http::Uri;
use serde::{Deserialize, Serialize};

/// Complete Accord client configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use accord_config::AccordConfig;
///
/// let config = AccordConfig::default();
/// assert_eq!(config.client.base_url, "http://localhost:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AccordConfig {
    /// Client settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AccordConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - the base URL is not an absolute `http`/`https` URL
    /// - the request id header or a default header is not a valid header
    /// - the log level is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url(&self.client.base_url)?;

        HeaderName::from_bytes(self.client.request_id_header.as_bytes()).map_err(|_| {
            ConfigError::invalid_value(
                "client.request_id_header",
                format!("invalid header name: {}", self.client.request_id_header),
            )
        })?;

        HeaderValue::from_str(&self.client.user_agent).map_err(|_| {
            ConfigError::invalid_value("client.user_agent", "not a valid header value")
        })?;

        for (name, value) in &self.client.default_headers {
            let field = format!("client.default_headers.{name}");
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConfigError::invalid_value(&field, "invalid header name"))?;
            HeaderValue::from_str(value)
                .map_err(|_| ConfigError::invalid_value(&field, "invalid header value"))?;
        }

        if self.logging.enabled {
            create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Development preset: pretty debug logging against a local API.
    ///
    /// ```
    /// use accord_config::{AccordConfig, LogFormat};
    ///
    /// let config = AccordConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }

    /// Production preset: JSON logging at info.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}

fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::invalid_value("client.base_url", reason);

    let uri: Uri = base_url
        .parse()
        .map_err(|_| invalid(&format!("invalid URL: {base_url}")))?;
    match uri.scheme_str() {
        Some("http" | "https") => {}
        Some(other) => return Err(invalid(&format!("unsupported scheme: {other}"))),
        None => return Err(invalid("URL must be absolute")),
    }
    if uri.host().is_none() {
        return Err(invalid("URL must have a host"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_base_url_is_rejected() {
        let mut config = AccordConfig::default();
        config.client.base_url = "/api".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("client.base_url"));
    }

    #[test]
    fn test_non_http_scheme_is_rejected() {
        let mut config = AccordConfig::default();
        config.client.base_url = "ftp://files.test".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_header_name_is_rejected() {
        let mut config = AccordConfig::default();
        config
            .client
            .default_headers
            .insert("bad header".to_string(), "x".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("client.default_headers.bad header"));
    }

    #[test]
    fn test_invalid_level_is_rejected_only_when_enabled() {
        let mut config = AccordConfig::default();
        config.logging.level = "accord=loud".to_string();
        assert!(config.validate().is_err());

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(AccordConfig::development().validate().is_ok());
        assert!(AccordConfig::production().validate().is_ok());
    }
}

//! The composition root.
//!
//! [`Accord`] turns an [`AccordConfig`] into a ready [`ApiClient`] with the
//! standard stage layout:
//!
//! ```text
//! API level:  Telemetry → Validation → HttpTransport
//! Wire level: RequestId → Auth (if a token provider is set) → WireLogging → Fetch
//! ```

use accord_client::{ApiClient, ClientError};
use accord_config::{AccordConfig, ConfigError};
use accord_core::EndpointMap;
use accord_middleware::stages::{
    AuthMiddleware, RequestIdMiddleware, TelemetryMiddleware, TokenProvider, ValidationMiddleware,
    WireLoggingMiddleware,
};
use accord_telemetry::{init_logging, Logger, TelemetryError};
use accord_transport::{Fetch, HttpTransport, TransportError};
use http::HeaderName;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while assembling a client from configuration.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The transport could not be built.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The client could not be built.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Logging could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Builds clients from configuration.
///
/// # Example
///
/// ```
/// use accord::prelude::*;
///
/// let mut config = AccordConfig::default();
/// config.client.base_url = "https://api.example.com".to_string();
///
/// let endpoints = EndpointMap::new().endpoint(
///     "ping",
///     EndpointSchema::get("/ping")
///         .returns(StatusCode::Ok, Shape::string())
///         .build()
///         .unwrap(),
/// );
///
/// let client = Accord::from_config(config)
///     .unwrap()
///     .client_name("pinger")
///     .client(endpoints)
///     .unwrap();
/// assert_eq!(client.stage_names(), vec!["telemetry", "validation"]);
/// ```
pub struct Accord {
    config: AccordConfig,
    client_name: String,
    logger: Logger,
    token_provider: Option<Arc<dyn TokenProvider>>,
    fetch: Option<Arc<dyn Fetch>>,
}

impl Accord {
    /// Validates `config` and starts a composition root with a
    /// `tracing`-backed logger.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Config`] if the configuration is invalid.
    pub fn from_config(config: AccordConfig) -> Result<Self, SetupError> {
        config.validate()?;
        Ok(Self {
            config,
            client_name: "accord".to_string(),
            logger: Logger::tracing(),
            token_provider: None,
            fetch: None,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AccordConfig {
        &self.config
    }

    /// Sets the name recorded on every call span.
    #[must_use]
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Replaces the logger that transport failures and contract violations
    /// are reported to.
    #[must_use]
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Adds bearer authentication from `provider`.
    #[must_use]
    pub fn token_provider(mut self, provider: impl TokenProvider) -> Self {
        self.token_provider = Some(Arc::new(provider));
        self
    }

    /// Replaces the network primitive.
    #[must_use]
    pub fn fetch(mut self, fetch: impl Fetch) -> Self {
        self.fetch = Some(Arc::new(fetch));
        self
    }

    /// Installs the global `tracing` subscriber described by the logging
    /// section.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Telemetry`] if a subscriber is already installed.
    pub fn init_logging(&self) -> Result<(), SetupError> {
        init_logging(&self.config.logging.to_log_config())?;
        Ok(())
    }

    /// Builds the HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Transport`] if a header is invalid or the HTTP
    /// client cannot be created.
    pub fn transport(&self) -> Result<HttpTransport, SetupError> {
        let client = &self.config.client;
        let header = HeaderName::from_bytes(client.request_id_header.as_bytes()).map_err(|e| {
            TransportError::InvalidHeader {
                name: client.request_id_header.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut builder = HttpTransport::builder(&client.base_url)
            .user_agent(&client.user_agent)
            .connect_timeout(Duration::from_millis(client.connect_timeout_ms))
            .logger(self.logger.clone())
            .wire_stage(RequestIdMiddleware::with_header(header));
        if let Some(provider) = &self.token_provider {
            builder = builder.wire_stage(AuthMiddleware::from_shared(Arc::clone(provider)));
        }
        builder = builder.wire_stage(WireLoggingMiddleware::new());
        for (name, value) in &client.default_headers {
            builder = builder.default_header(name, value);
        }
        if let Some(fetch) = &self.fetch {
            builder = builder.shared_fetch(Arc::clone(fetch));
        }

        Ok(builder.build()?)
    }

    /// Builds a client for `endpoints`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the transport or client cannot be built.
    pub fn client(&self, endpoints: EndpointMap) -> Result<ApiClient, SetupError> {
        let transport = self.transport()?;
        let telemetry = TelemetryMiddleware::builder(&self.client_name)
            .version(env!("CARGO_PKG_VERSION"))
            .build();

        let client = ApiClient::builder()
            .endpoints(endpoints)
            .middleware(telemetry)
            .middleware(ValidationMiddleware::with_logger(self.logger.clone()))
            .transport(transport)
            .build()?;

        tracing::info!(
            client = %self.client_name,
            base_url = %self.config.client.base_url,
            endpoints = client.endpoint_names().count(),
            "accord client built"
        );
        Ok(client)
    }
}

impl fmt::Debug for Accord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accord")
            .field("client_name", &self.client_name)
            .field("base_url", &self.config.client.base_url)
            .field("auth", &self.token_provider.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = AccordConfig::default();
        config.client.base_url = "not a url".to_string();
        assert!(matches!(
            Accord::from_config(config),
            Err(SetupError::Config(_))
        ));
    }

    #[test]
    fn test_wire_stages_follow_config() {
        let plain = Accord::from_config(AccordConfig::default()).unwrap();
        assert_eq!(
            plain.transport().unwrap().wire_stage_names(),
            vec!["request_id", "wire_logging"]
        );

        let authed = plain.token_provider(|| async { Some("t".to_string()) });
        assert_eq!(
            authed.transport().unwrap().wire_stage_names(),
            vec!["request_id", "auth", "wire_logging"]
        );
    }
}

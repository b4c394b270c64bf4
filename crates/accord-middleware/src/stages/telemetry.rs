//! Call telemetry.
//!
//! [`TelemetryMiddleware`] opens one `tracing` span per call and emits a
//! single event when the call settles, carrying the endpoint, request id,
//! status or error kind, and duration.
//!
//! Cancellation is an expected outcome: it is reported at `debug` level and
//! never as a failure.
//!
//! # Pipeline Position
//!
//! Telemetry runs first so its duration covers validation and transport:
//!
//! ```text
//! RequestContext → [Telemetry] → Validation → HttpTransport
//! ```
//!
//! # Example
//!
//! ```
//! use accord_middleware::stages::TelemetryMiddleware;
//!
//! let telemetry = TelemetryMiddleware::builder("mobile")
//!     .version("2.4.0")
//!     .verbose(true)
//!     .build();
//! assert_eq!(telemetry.client_name(), "mobile");
//! ```

use crate::middleware::{Middleware, Next};
use accord_core::{AccordError, AccordResult, BoxFuture, ErrorKind, RequestContext, Response};
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Emits a span and a completion event for every call.
#[derive(Debug, Clone)]
pub struct TelemetryMiddleware {
    client_name: String,
    version: String,
    verbose: bool,
}

/// What one call looked like once it settled.
#[derive(Debug, Clone, PartialEq)]
pub struct CallTelemetry {
    /// The client name.
    pub client_name: String,
    /// The client version.
    pub version: String,
    /// The endpoint name.
    pub endpoint: String,
    /// The request id.
    pub request_id: String,
    /// The response status, on success.
    pub status: Option<u16>,
    /// The error kind, on failure.
    pub error_kind: Option<ErrorKind>,
    /// Call duration in milliseconds.
    pub duration_ms: f64,
}

impl CallTelemetry {
    /// Returns `ok`, `cancelled` or `failed`.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self.error_kind {
            None => "ok",
            Some(ErrorKind::Cancelled) => "cancelled",
            Some(_) => "failed",
        }
    }
}

impl TelemetryMiddleware {
    /// Creates telemetry for the client named `client_name`.
    #[must_use]
    pub fn new(client_name: &str) -> Self {
        Self::builder(client_name).build()
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder(client_name: &str) -> TelemetryBuilder {
        TelemetryBuilder {
            client_name: client_name.to_string(),
            version: "unknown".to_string(),
            verbose: false,
        }
    }

    /// Returns the client name.
    #[must_use]
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    fn collect(
        &self,
        endpoint: &str,
        request_id: String,
        outcome: &AccordResult<Response>,
        duration: Duration,
    ) -> CallTelemetry {
        let (status, error_kind) = match outcome {
            Ok(response) => (Some(response.status.as_u16()), None),
            Err(err) => (err.status(), Some(err.kind())),
        };
        CallTelemetry {
            client_name: self.client_name.clone(),
            version: self.version.clone(),
            endpoint: endpoint.to_string(),
            request_id,
            status,
            error_kind,
            duration_ms: duration.as_secs_f64() * 1000.0,
        }
    }

    fn emit(&self, data: &CallTelemetry, error: Option<&AccordError>) {
        match (data.error_kind, error) {
            (None, _) => tracing::info!(
                endpoint = %data.endpoint,
                status = data.status,
                duration_ms = data.duration_ms,
                outcome = data.outcome(),
                "call completed"
            ),
            (Some(ErrorKind::Cancelled), _) => tracing::debug!(
                endpoint = %data.endpoint,
                duration_ms = data.duration_ms,
                outcome = data.outcome(),
                "call cancelled"
            ),
            (Some(kind), error) => tracing::warn!(
                endpoint = %data.endpoint,
                status = data.status,
                error_kind = kind.as_str(),
                error = error.map(tracing::field::display),
                duration_ms = data.duration_ms,
                outcome = data.outcome(),
                "call failed"
            ),
        }
    }
}

impl Middleware<RequestContext, Response> for TelemetryMiddleware {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    fn process<'a>(
        &'a self,
        ctx: RequestContext,
        next: Next<'a, RequestContext, Response>,
    ) -> BoxFuture<'a, AccordResult<Response>> {
        let endpoint = ctx.endpoint_name().to_string();
        let request_id = ctx.request_id().to_string();
        let span = tracing::info_span!(
            "accord.call",
            client = %self.client_name,
            endpoint = %endpoint,
            request_id = %request_id,
            method = %ctx.schema().method(),
            path = ctx.schema().path(),
        );

        Box::pin(
            async move {
                if self.verbose {
                    tracing::debug!(input = %ctx.input_snapshot(), "call started");
                }

                let start = Instant::now();
                let outcome = next.run(ctx).await;
                let data = self.collect(&endpoint, request_id, &outcome, start.elapsed());
                self.emit(&data, outcome.as_ref().err());
                outcome
            }
            .instrument(span),
        )
    }
}

/// Builder for [`TelemetryMiddleware`].
#[derive(Debug)]
pub struct TelemetryBuilder {
    client_name: String,
    version: String,
    verbose: bool,
}

impl TelemetryBuilder {
    /// Sets the client version reported with every call.
    #[must_use]
    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Also logs the call input at `debug` level.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builds the middleware.
    #[must_use]
    pub fn build(self) -> TelemetryMiddleware {
        TelemetryMiddleware {
            client_name: self.client_name,
            version: self.version,
            verbose: self.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::{CallInput, EndpointSchema, Shape, StatusCode};
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> RequestContext {
        let schema = EndpointSchema::get("/feed")
            .returns(StatusCode::Ok, Shape::any())
            .build()
            .unwrap();
        RequestContext::new("feed", Arc::new(schema), CallInput::new()).unwrap()
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let telemetry = TelemetryMiddleware::new("mobile");
        let handler = |_ctx: RequestContext| async {
            Ok::<_, AccordError>(Response::with_data(StatusCode::Ok, json!(["post"])))
        };

        let response = telemetry
            .process(context(), Next::handler(&handler))
            .await
            .unwrap();

        assert_eq!(response.data, Some(json!(["post"])));
    }

    #[tokio::test]
    async fn test_errors_pass_through_unchanged() {
        let telemetry = TelemetryMiddleware::builder("mobile").verbose(true).build();
        let handler = |ctx: RequestContext| async move {
            Err::<Response, _>(AccordError::Cancelled {
                endpoint: ctx.endpoint_name().to_string(),
            })
        };

        let err = telemetry
            .process(context(), Next::handler(&handler))
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
    }

    #[test]
    fn test_collect_classifies_outcomes() {
        let telemetry = TelemetryMiddleware::builder("mobile").version("1.2.0").build();

        let ok = telemetry.collect(
            "feed",
            "id".to_string(),
            &Ok(Response::empty(StatusCode::NoContent)),
            Duration::from_millis(5),
        );
        assert_eq!(ok.outcome(), "ok");
        assert_eq!(ok.status, Some(204));
        assert_eq!(ok.version, "1.2.0");
        assert!((ok.duration_ms - 5.0).abs() < 1e-6);

        let cancelled = telemetry.collect(
            "feed",
            "id".to_string(),
            &Err(AccordError::Cancelled {
                endpoint: "feed".to_string(),
            }),
            Duration::ZERO,
        );
        assert_eq!(cancelled.outcome(), "cancelled");

        let failed = telemetry.collect(
            "feed",
            "id".to_string(),
            &Err(AccordError::UnexpectedResponse {
                endpoint: "feed".to_string(),
                status: 500,
                body: None,
            }),
            Duration::ZERO,
        );
        assert_eq!(failed.outcome(), "failed");
        assert_eq!(failed.status, Some(500));
        assert_eq!(failed.error_kind, Some(ErrorKind::UnexpectedResponse));
    }
}

//! Wire-level request logging.
//!
//! [`WireLoggingMiddleware`] emits one `tracing` event per network exchange
//! with the method, URL, status and duration. Server errors are logged at
//! `warn`, everything else at `debug`. A request dropped because its call
//! was cancelled never settles here, so it is not logged.

use crate::middleware::{Middleware, Next};
use accord_core::wire::{endpoint_of, WireRequest, WireResponse};
use accord_core::{AccordResult, BoxFuture};
use std::time::Instant;

/// Logs every exchange with the network primitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireLoggingMiddleware {
    include_query: bool,
}

impl WireLoggingMiddleware {
    /// Logs the URL without its query string.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            include_query: false,
        }
    }

    /// Also logs the query string.
    #[must_use]
    pub const fn with_query(mut self, include_query: bool) -> Self {
        self.include_query = include_query;
        self
    }

    fn loggable_url(&self, request: &WireRequest) -> String {
        let uri = request.uri();
        if self.include_query {
            return uri.to_string();
        }
        let mut url = String::new();
        if let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) {
            url.push_str(scheme);
            url.push_str("://");
            url.push_str(authority.as_str());
        }
        url.push_str(uri.path());
        url
    }
}

impl Middleware<WireRequest, WireResponse> for WireLoggingMiddleware {
    fn name(&self) -> &'static str {
        "wire_logging"
    }

    fn process<'a>(
        &'a self,
        request: WireRequest,
        next: Next<'a, WireRequest, WireResponse>,
    ) -> BoxFuture<'a, AccordResult<WireResponse>> {
        Box::pin(async move {
            let method = request.method().clone();
            let url = self.loggable_url(&request);
            let endpoint = endpoint_of(&request).unwrap_or("unknown").to_string();
            let start = Instant::now();

            let result = next.run(request).await;
            let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

            match &result {
                Ok(response) if response.status().is_server_error() => tracing::warn!(
                    endpoint = %endpoint,
                    method = %method,
                    url = %url,
                    status = response.status().as_u16(),
                    duration_ms,
                    "server error"
                ),
                Ok(response) => tracing::debug!(
                    endpoint = %endpoint,
                    method = %method,
                    url = %url,
                    status = response.status().as_u16(),
                    duration_ms,
                    "exchange completed"
                ),
                Err(err) => tracing::warn!(
                    endpoint = %endpoint,
                    method = %method,
                    url = %url,
                    error = %err,
                    duration_ms,
                    "exchange failed"
                ),
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::AccordError;
    use bytes::Bytes;

    fn request(uri: &str) -> WireRequest {
        http::Request::builder()
            .method(http::Method::POST)
            .uri(uri)
            .body(Bytes::from_static(b"{}"))
            .unwrap()
    }

    #[test]
    fn test_query_is_hidden_by_default() {
        let req = request("https://api.test/feed?token=abc");
        assert_eq!(
            WireLoggingMiddleware::new().loggable_url(&req),
            "https://api.test/feed"
        );
        assert_eq!(
            WireLoggingMiddleware::new()
                .with_query(true)
                .loggable_url(&req),
            "https://api.test/feed?token=abc"
        );
    }

    #[tokio::test]
    async fn test_response_passes_through() {
        let handler = |request: WireRequest| async move {
            let response = http::Response::builder()
                .status(503)
                .body(request.into_body())
                .unwrap();
            Ok::<_, AccordError>(response)
        };

        let response = WireLoggingMiddleware::new()
            .process(request("https://api.test/user"), Next::handler(&handler))
            .await
            .unwrap();

        assert_eq!(response.status(), http::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body().as_ref(), b"{}");
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let handler = |_request: WireRequest| async {
            Err::<WireResponse, _>(AccordError::transport(
                "user",
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            ))
        };

        let err = WireLoggingMiddleware::new()
            .process(request("https://api.test/user"), Next::handler(&handler))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("refused"));
    }
}

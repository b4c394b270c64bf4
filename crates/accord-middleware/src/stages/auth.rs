//! Bearer token injection.
//!
//! [`AuthMiddleware`] asks a [`TokenProvider`] for a token on every request
//! and, when one is available, sets `Authorization: Bearer <token>`. When the
//! provider yields nothing the request goes out unchanged.
//!
//! The provider is shared by every concurrent call, so it must be safe to
//! invoke concurrently.
//!
//! # Example
//!
//! ```
//! use accord_middleware::stages::AuthMiddleware;
//!
//! let auth = AuthMiddleware::new(|| async { Some("s3cr3t".to_string()) });
//! assert_eq!(auth.scheme(), "Bearer");
//! ```

use crate::middleware::{Middleware, Next};
use accord_core::wire::{endpoint_of, WireRequest, WireResponse};
use accord_core::{AccordError, AccordResult, BoxFuture};
use http::header::{HeaderValue, AUTHORIZATION};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Supplies the current access token, if any.
///
/// Implemented for any `Fn() -> impl Future<Output = Option<String>>`.
pub trait TokenProvider: Send + Sync + 'static {
    /// Returns the token to send, or `None` to send no credentials.
    fn token(&self) -> BoxFuture<'_, Option<String>>;
}

impl<F, Fut> TokenProvider for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    fn token(&self) -> BoxFuture<'_, Option<String>> {
        Box::pin(self())
    }
}

/// A provider that always yields the same token.
#[derive(Clone)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn token(&self) -> BoxFuture<'_, Option<String>> {
        Box::pin(std::future::ready(Some(self.0.clone())))
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

/// Sets the `Authorization` header from a [`TokenProvider`].
#[derive(Clone)]
pub struct AuthMiddleware {
    provider: Arc<dyn TokenProvider>,
    scheme: String,
}

impl AuthMiddleware {
    /// Creates the stage with the `Bearer` scheme.
    pub fn new(provider: impl TokenProvider) -> Self {
        Self::from_shared(Arc::new(provider))
    }

    /// Creates the stage from an already shared provider.
    pub fn from_shared(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            scheme: "Bearer".to_string(),
        }
    }

    /// Replaces the authorization scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Returns the authorization scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

impl fmt::Debug for AuthMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthMiddleware")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

impl Middleware<WireRequest, WireResponse> for AuthMiddleware {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn process<'a>(
        &'a self,
        mut request: WireRequest,
        next: Next<'a, WireRequest, WireResponse>,
    ) -> BoxFuture<'a, AccordResult<WireResponse>> {
        Box::pin(async move {
            if let Some(token) = self.provider.token().await {
                let mut value = HeaderValue::try_from(format!("{} {token}", self.scheme))
                    .map_err(|e| {
                        AccordError::transport(endpoint_of(&request).unwrap_or("unknown"), e)
                    })?;
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            next.run(request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::wire::EndpointTag;
    use accord_core::ErrorKind;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request() -> WireRequest {
        let mut request = http::Request::builder()
            .uri("https://api.test/me")
            .body(Bytes::new())
            .unwrap();
        request.extensions_mut().insert(EndpointTag(Arc::from("me")));
        request
    }

    async fn echo_authorization(request: WireRequest) -> AccordResult<WireResponse> {
        let header = request
            .headers()
            .get(AUTHORIZATION)
            .map(|v| Bytes::copy_from_slice(v.as_bytes()))
            .unwrap_or_default();
        Ok(http::Response::new(header))
    }

    #[tokio::test]
    async fn test_sets_bearer_header() {
        let auth = AuthMiddleware::new(|| async { Some("t0k3n".to_string()) });
        let response = auth
            .process(request(), Next::handler(&echo_authorization))
            .await
            .unwrap();
        assert_eq!(response.body().as_ref(), b"Bearer t0k3n");
    }

    #[tokio::test]
    async fn test_no_token_leaves_request_unchanged() {
        let auth = AuthMiddleware::new(|| async { None::<String> });
        let response = auth
            .process(request(), Next::handler(&echo_authorization))
            .await
            .unwrap();
        assert!(response.body().is_empty());
    }

    #[tokio::test]
    async fn test_provider_is_asked_per_request() {
        let asked = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&asked);
        let auth = AuthMiddleware::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move { Some(format!("token-{n}")) }
        })
        .with_scheme("Token");

        let first = auth
            .process(request(), Next::handler(&echo_authorization))
            .await
            .unwrap();
        let second = auth
            .process(request(), Next::handler(&echo_authorization))
            .await
            .unwrap();

        assert_eq!(first.body().as_ref(), b"Token token-0");
        assert_eq!(second.body().as_ref(), b"Token token-1");
        assert_eq!(asked.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unrepresentable_token_fails_before_sending() {
        let auth = AuthMiddleware::new(StaticToken("bad\ntoken".to_string()));
        let sent = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&sent);
        let handler = move |_request: WireRequest| {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok::<_, AccordError>(http::Response::new(Bytes::new())))
        };

        let err = auth
            .process(request(), Next::handler(&handler))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.endpoint(), Some("me"));
        assert_eq!(sent.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_static_token_is_redacted_in_debug() {
        let token = StaticToken("s3cr3t".to_string());
        assert!(!format!("{token:?}").contains("s3cr3t"));
    }
}

//! The network primitive.
//!
//! [`Fetch`] sends one fully buffered request and returns the fully buffered
//! response. It is the terminal of the wire-level chain. Dropping the
//! returned future abandons the exchange, which is how cancellation reaches
//! the network.
//!
//! [`ReqwestFetch`] is the production implementation. Any
//! `Fn(WireRequest) -> impl Future<Output = anyhow::Result<WireResponse>>`
//! is a `Fetch` too, which keeps test doubles short.

use accord_core::wire::{endpoint_of, WireRequest, WireResponse};
use accord_core::{AccordError, AccordResult, BoxFuture};
use accord_middleware::Handler;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Sends a request over the network.
pub trait Fetch: Send + Sync + 'static {
    /// Performs one exchange.
    fn fetch(&self, request: WireRequest) -> BoxFuture<'_, anyhow::Result<WireResponse>>;
}

impl<F, Fut> Fetch for F
where
    F: Fn(WireRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<WireResponse>> + Send + 'static,
{
    fn fetch(&self, request: WireRequest) -> BoxFuture<'_, anyhow::Result<WireResponse>> {
        Box::pin(self(request))
    }
}

/// A [`Fetch`] backed by a `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    /// Uses a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client with a connect timeout and user agent.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn configured(user_agent: &str, connect_timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for ReqwestFetch {
    fn fetch(&self, request: WireRequest) -> BoxFuture<'_, anyhow::Result<WireResponse>> {
        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let mut builder = self
                .client
                .request(parts.method, parts.uri.to_string())
                .headers(parts.headers);
            if !body.is_empty() {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;

            let mut out = http::Response::new(body);
            *out.status_mut() = status;
            *out.headers_mut() = headers;
            Ok(out)
        })
    }
}

/// Adapts a [`Fetch`] into the terminal [`Handler`] of the wire chain.
///
/// Network failures become [`AccordError::Transport`] tagged with the
/// endpoint the request belongs to.
#[derive(Clone)]
pub struct FetchHandler {
    fetch: Arc<dyn Fetch>,
}

impl FetchHandler {
    /// Wraps `fetch`.
    pub fn new(fetch: Arc<dyn Fetch>) -> Self {
        Self { fetch }
    }
}

impl std::fmt::Debug for FetchHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchHandler").finish_non_exhaustive()
    }
}

impl Handler<WireRequest, WireResponse> for FetchHandler {
    fn call<'a>(&'a self, request: WireRequest) -> BoxFuture<'a, AccordResult<WireResponse>> {
        let endpoint = endpoint_of(&request).unwrap_or("unknown").to_string();
        Box::pin(async move {
            self.fetch
                .fetch(request)
                .await
                .map_err(|source| AccordError::Transport { endpoint, source })
        })
    }
}

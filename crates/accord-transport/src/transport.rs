//! The terminal transport handler.
//!
//! [`HttpTransport`] resolves a [`RequestContext`] to a [`Response`] over
//! HTTP:
//!
//! 1. Build the URL from the base URL, path template, `params` and `query`
//! 2. Build the wire request: schema method, `Content-Type:
//!    application/json`, JSON body (never for `GET`/`HEAD`), plus the
//!    endpoint tag, request id and abort signal as extensions
//! 3. Run the wire-level chain with the [`Fetch`] primitive as its terminal,
//!    racing it against the abort signal
//! 4. Interpret the body:
//!    - undecodable body with `204`: no data
//!    - undecodable body with any other status: [`AccordError::NonJsonBody`]
//!    - decoded body with `204`: [`AccordError::NoContentWithBody`]
//!    - status outside [`StatusCode`]: [`AccordError::UnexpectedResponse`]
//!
//! Every failure except cancellation is reported to the [`Logger`] before it
//! is returned. Cancellation is never logged.
//!
//! # Example
//!
//! ```
//! use accord_middleware::stages::{AuthMiddleware, RequestIdMiddleware};
//! use accord_telemetry::Logger;
//! use accord_transport::HttpTransport;
//!
//! let transport = HttpTransport::builder("https://api.example.com")
//!     .wire_stage(RequestIdMiddleware::new())
//!     .wire_stage(AuthMiddleware::new(|| async { Some("token".to_string()) }))
//!     .logger(Logger::tracing())
//!     .build()
//!     .unwrap();
//! assert_eq!(transport.base_url(), "https://api.example.com");
//! ```

use crate::error::{TransportError, TransportResult};
use crate::fetch::{Fetch, FetchHandler, ReqwestFetch};
use crate::url::build_url;
use accord_core::wire::{EndpointTag, WireRequest, WireResponse};
use accord_core::{AccordError, AccordResult, BoxFuture, RequestContext, Response, StatusCode};
use accord_middleware::{BoxedMiddleware, Chain, Handler, Middleware};
use accord_telemetry::{fields, Logger};
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const APPLICATION_JSON: &str = "application/json";
const DEFAULT_USER_AGENT: &str = concat!("accord/", env!("CARGO_PKG_VERSION"));
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes calls over HTTP. The terminal of the API-level chain.
pub struct HttpTransport {
    base_url: String,
    default_headers: HeaderMap,
    wire: Chain<WireRequest, WireResponse>,
    logger: Logger,
}

impl HttpTransport {
    /// Creates a builder for the API at `base_url`.
    pub fn builder(base_url: impl Into<String>) -> HttpTransportBuilder {
        HttpTransportBuilder::new(base_url)
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the names of the wire-level stages in order.
    #[must_use]
    pub fn wire_stage_names(&self) -> Vec<&'static str> {
        self.wire.stage_names()
    }

    async fn execute(&self, ctx: &RequestContext) -> AccordResult<Response> {
        let endpoint = ctx.endpoint_name();
        if ctx.is_aborted() {
            return Err(cancelled(endpoint));
        }

        let request = self.wire_request(ctx)?;
        let signal = ctx.signal().clone();
        let raw = tokio::select! {
            biased;
            () = signal.aborted() => return Err(cancelled(endpoint)),
            result = self.wire.run(request) => result?,
        };

        interpret(endpoint, raw)
    }

    fn wire_request(&self, ctx: &RequestContext) -> AccordResult<WireRequest> {
        let endpoint = ctx.endpoint_name();
        let binding = ctx.schema().http();
        let url = build_url(&self.base_url, endpoint, binding, ctx.params(), ctx.query())?;

        let body = match ctx.body() {
            Some(body) if binding.allows_body() => {
                serde_json::to_vec(body).map_err(|e| AccordError::Encode {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                })?
            }
            _ => Vec::new(),
        };

        let mut request = http::Request::builder()
            .method(binding.method.clone())
            .uri(url)
            .body(Bytes::from(body))
            .map_err(|e| AccordError::transport(endpoint, e))?;

        let headers = request.headers_mut();
        headers.extend(self.default_headers.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));

        let extensions = request.extensions_mut();
        extensions.insert(EndpointTag(ctx.endpoint_tag()));
        extensions.insert(ctx.request_id());
        extensions.insert(ctx.signal().clone());
        Ok(request)
    }

    fn report(&self, ctx: &RequestContext, err: &AccordError) {
        if err.is_cancelled() {
            return;
        }

        let message = err.to_string();
        let mut metadata = Map::new();
        metadata.insert(fields::ERROR_KIND.to_string(), Value::from(err.kind().as_str()));
        metadata.insert(fields::ERROR.to_string(), Value::from(message.clone()));
        metadata.insert(fields::MESSAGE.to_string(), Value::from(message.clone()));
        metadata.insert(fields::INPUT.to_string(), ctx.input_snapshot());
        metadata.insert(
            fields::ENDPOINT.to_string(),
            Value::from(ctx.endpoint_name()),
        );
        metadata.insert(
            fields::REQUEST_ID.to_string(),
            Value::from(ctx.request_id().to_string()),
        );
        if let Some(status) = err.status() {
            metadata.insert(fields::HTTP_STATUS.to_string(), Value::from(status));
        }
        self.logger.error(message, Value::Object(metadata));
    }
}

impl Handler<RequestContext, Response> for HttpTransport {
    fn call<'a>(&'a self, ctx: RequestContext) -> BoxFuture<'a, AccordResult<Response>> {
        Box::pin(async move {
            let result = self.execute(&ctx).await;
            if let Err(err) = &result {
                self.report(&ctx, err);
            }
            result
        })
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("wire", &self.wire)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

fn cancelled(endpoint: &str) -> AccordError {
    AccordError::Cancelled {
        endpoint: endpoint.to_string(),
    }
}

/// Turns a raw wire response into a [`Response`].
///
/// # Errors
///
/// See the module documentation for the failure cases.
pub fn interpret(endpoint: &str, raw: WireResponse) -> AccordResult<Response> {
    let code = raw.status().as_u16();
    let body = raw.into_body();
    let decoded = serde_json::from_slice::<Value>(&body);
    let no_content = code == StatusCode::NoContent.as_u16();

    match decoded {
        Err(_) if no_content => Ok(Response::empty(StatusCode::NoContent)),
        Err(_) => Err(AccordError::NonJsonBody {
            endpoint: endpoint.to_string(),
            status: code,
            body: String::from_utf8_lossy(&body).into_owned(),
        }),
        Ok(data) if no_content => Err(AccordError::NoContentWithBody {
            endpoint: endpoint.to_string(),
            body: data,
        }),
        Ok(data) => match StatusCode::from_u16(code) {
            Some(status) => Ok(Response::with_data(status, data)),
            None => Err(AccordError::UnexpectedResponse {
                endpoint: endpoint.to_string(),
                status: code,
                body: Some(data),
            }),
        },
    }
}

/// Builder for [`HttpTransport`].
#[must_use = "builders do nothing unless built"]
pub struct HttpTransportBuilder {
    base_url: String,
    default_headers: Vec<(String, String)>,
    stages: Vec<BoxedMiddleware<WireRequest, WireResponse>>,
    fetch: Option<Arc<dyn Fetch>>,
    user_agent: Option<String>,
    connect_timeout: Duration,
    logger: Logger,
}

impl HttpTransportBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers: Vec::new(),
            stages: Vec::new(),
            fetch: None,
            user_agent: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            logger: Logger::new(),
        }
    }

    /// Appends a wire-level stage. Stages run in the order added.
    pub fn wire_stage<M: Middleware<WireRequest, WireResponse>>(mut self, stage: M) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Appends an already shared wire-level stage.
    pub fn shared_wire_stage(mut self, stage: BoxedMiddleware<WireRequest, WireResponse>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Sets the network primitive. Defaults to [`ReqwestFetch`].
    pub fn fetch(mut self, fetch: impl Fetch) -> Self {
        self.fetch = Some(Arc::new(fetch));
        self
    }

    /// Sets an already shared network primitive.
    pub fn shared_fetch(mut self, fetch: Arc<dyn Fetch>) -> Self {
        self.fetch = Some(fetch);
        self
    }

    /// Sets the `User-Agent` of the default [`ReqwestFetch`].
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the connect timeout of the default [`ReqwestFetch`].
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the logger failures are reported to. Defaults to one with no sinks.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Adds a header sent with every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Fails if the base URL is not an absolute `http`/`https` URL, a default
    /// header is invalid, or the default HTTP client cannot be created.
    pub fn build(self) -> TransportResult<HttpTransport> {
        let base_url = validate_base_url(&self.base_url)?;

        let mut default_headers = HeaderMap::new();
        for (name, value) in self.default_headers {
            let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                }
            })?;
            let value = HeaderValue::from_str(&value).map_err(|e| TransportError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            default_headers.append(header, value);
        }

        let fetch: Arc<dyn Fetch> = match self.fetch {
            Some(fetch) => fetch,
            None => {
                let user_agent = self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
                let fetch = ReqwestFetch::configured(user_agent, self.connect_timeout)
                    .map_err(|e| TransportError::Client(e.to_string()))?;
                Arc::new(fetch)
            }
        };
        let wire = Chain::builder()
            .stages(self.stages)
            .terminal(FetchHandler::new(fetch))
            .build();

        tracing::debug!(base_url = %base_url, stages = ?wire.stage_names(), "transport ready");

        Ok(HttpTransport {
            base_url,
            default_headers,
            wire,
            logger: self.logger,
        })
    }
}

impl fmt::Debug for HttpTransportBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransportBuilder")
            .field("base_url", &self.base_url)
            .field("stages", &self.stages.len())
            .finish_non_exhaustive()
    }
}

/// Checks that `base_url` is an absolute `http`/`https` URL without a query
/// and returns it without a trailing slash.
///
/// # Errors
///
/// Returns [`TransportError::InvalidBaseUrl`] otherwise.
pub fn validate_base_url(base_url: &str) -> TransportResult<String> {
    let invalid = |reason: &str| TransportError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: reason.to_string(),
    };

    let uri: http::Uri = base_url.parse().map_err(|_| invalid("not a valid URL"))?;
    match uri.scheme_str() {
        Some("http" | "https") => {}
        Some(_) => return Err(invalid("scheme must be http or https")),
        None => return Err(invalid("URL must be absolute")),
    }
    if uri.host().is_none() {
        return Err(invalid("URL must have a host"));
    }
    if uri.query().is_some() {
        return Err(invalid("URL must not have a query"));
    }
    Ok(base_url.trim_end_matches('/').to_string())
}

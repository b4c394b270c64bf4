//! Request ID propagation.
//!
//! [`RequestIdMiddleware`] attaches a request id header to every outgoing
//! request so client and server logs can be correlated.
//!
//! ## Request ID Sources
//!
//! 1. **Existing header**: a header already set on the request is kept
//! 2. **Call id**: the [`RequestId`] the transport attached as an extension,
//!    which is the id the API-level stages logged
//! 3. **Generated UUID v7**: otherwise a new id is generated
//!
//! The id used is also stored in the response extensions.

use crate::middleware::{Middleware, Next};
use accord_core::wire::{WireRequest, WireResponse};
use accord_core::{AccordResult, BoxFuture, RequestId};
use http::header::{HeaderName, HeaderValue};

/// The default request id header.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Attaches a request id header to outgoing requests.
#[derive(Debug, Clone)]
pub struct RequestIdMiddleware {
    header: HeaderName,
}

impl Default for RequestIdMiddleware {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static(REQUEST_ID_HEADER),
        }
    }
}

impl RequestIdMiddleware {
    /// Uses the `x-request-id` header.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom header.
    #[must_use]
    pub fn with_header(header: HeaderName) -> Self {
        Self { header }
    }

    /// Returns the header name.
    #[must_use]
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    fn existing(&self, request: &WireRequest) -> Option<RequestId> {
        request
            .headers()
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .and_then(|s| uuid::Uuid::parse_str(s).ok())
            .map(RequestId::from_uuid)
    }
}

impl Middleware<WireRequest, WireResponse> for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        mut request: WireRequest,
        next: Next<'a, WireRequest, WireResponse>,
    ) -> BoxFuture<'a, AccordResult<WireResponse>> {
        Box::pin(async move {
            let request_id = match self.existing(&request) {
                Some(id) => id,
                None => {
                    let id = request
                        .extensions()
                        .get::<RequestId>()
                        .copied()
                        .unwrap_or_default();
                    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                        request.headers_mut().insert(self.header.clone(), value);
                    }
                    id
                }
            };

            let mut response = next.run(request).await?;
            response.extensions_mut().insert(request_id);
            Ok(response)
        })
    }
}

//! Wire-level request and response types.
//!
//! Transport-level middleware (auth, request id, logging) operates on these
//! rather than on [`RequestContext`](crate::RequestContext). The transport
//! attaches the call's [`AbortSignal`] and an [`EndpointTag`] as request
//! extensions so wire stages can observe both.

use crate::abort::AbortSignal;
use bytes::Bytes;
use std::sync::Arc;

/// An outgoing HTTP request with a fully buffered body.
pub type WireRequest = http::Request<Bytes>;

/// An incoming HTTP response with a fully buffered body.
pub type WireResponse = http::Response<Bytes>;

/// Request extension naming the endpoint a wire request belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTag(pub Arc<str>);

impl EndpointTag {
    /// Returns the endpoint name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns the endpoint name attached to `request`, if any.
#[must_use]
pub fn endpoint_of(request: &WireRequest) -> Option<&str> {
    request.extensions().get::<EndpointTag>().map(EndpointTag::as_str)
}

/// Returns the abort signal attached to `request`, if any.
#[must_use]
pub fn signal_of(request: &WireRequest) -> Option<&AbortSignal> {
    request.extensions().get::<AbortSignal>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abort::AbortController;

    #[test]
    fn test_extensions_round_trip_through_request() {
        let controller = AbortController::new();
        let mut request = WireRequest::new(Bytes::new());
        request
            .extensions_mut()
            .insert(EndpointTag(Arc::from("getUser")));
        request.extensions_mut().insert(controller.signal());

        assert_eq!(endpoint_of(&request), Some("getUser"));
        controller.abort();
        assert!(signal_of(&request).is_some_and(AbortSignal::is_aborted));
    }

    #[test]
    fn test_missing_extensions() {
        let request = WireRequest::new(Bytes::new());
        assert_eq!(endpoint_of(&request), None);
        assert!(signal_of(&request).is_none());
    }
}

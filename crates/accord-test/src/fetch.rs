//! A scripted [`Fetch`].
//!
//! [`MockFetch`] answers requests from a route table keyed by method and
//! path, and records every request it sees. Clones share the table and the
//! recording, so a test can hand one clone to the transport and inspect the
//! other.
//!
//! Routes are matched in registration order. A route added with
//! [`once`](MockFetch::once) answers a single request and is then skipped.
//! A request with no matching route fails like a network error.

use crate::response::{MockResponse, Outcome};
use accord_core::wire::{endpoint_of, WireRequest, WireResponse};
use accord_core::BoxFuture;
use accord_transport::Fetch;
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

struct Route {
    method: Method,
    path: String,
    response: MockResponse,
    remaining: Option<usize>,
}

#[derive(Default)]
struct Inner {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<RecordedRequest>>,
}

/// A request captured by [`MockFetch`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Full request URI.
    pub uri: Uri,
    /// Request headers.
    pub headers: HeaderMap,
    /// Raw body.
    pub body: Bytes,
    /// Endpoint the request was sent for.
    pub endpoint: Option<String>,
}

impl RecordedRequest {
    /// Returns the URI path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Returns a header as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Parses the body as JSON. `None` if empty or not JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// A [`Fetch`] that answers from a route table.
///
/// # Example
///
/// ```
/// use accord_test::{MockFetch, MockResponse};
/// use serde_json::json;
///
/// let fetch = MockFetch::new()
///     .on("POST", "/user", MockResponse::json(201, &json!({"id": "u1"})))
///     .once("DELETE", "/user/u1", MockResponse::empty(204));
/// assert_eq!(fetch.call_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockFetch {
    inner: Arc<Inner>,
}

impl MockFetch {
    /// Creates a fetch with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every `method path` request with `response`.
    ///
    /// # Panics
    ///
    /// Panics if `method` is not a valid HTTP method.
    #[must_use]
    pub fn on(self, method: &str, path: &str, response: MockResponse) -> Self {
        self.route(method, path, response, None)
    }

    /// Answers the next `method path` request with `response`.
    ///
    /// # Panics
    ///
    /// Panics if `method` is not a valid HTTP method.
    #[must_use]
    pub fn once(self, method: &str, path: &str, response: MockResponse) -> Self {
        self.route(method, path, response, Some(1))
    }

    fn route(self, method: &str, path: &str, response: MockResponse, remaining: Option<usize>) -> Self {
        let method = Method::from_bytes(method.as_bytes()).expect("valid HTTP method");
        self.inner.routes.lock().push(Route {
            method,
            path: path.to_string(),
            response,
            remaining,
        });
        self
    }

    /// Returns every request seen so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedRequest> {
        self.inner.calls.lock().clone()
    }

    /// Returns the number of requests seen so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().len()
    }

    /// Returns the most recent request.
    #[must_use]
    pub fn last_call(&self) -> Option<RecordedRequest> {
        self.inner.calls.lock().last().cloned()
    }

    fn answer(&self, method: &Method, path: &str) -> Option<MockResponse> {
        let mut routes = self.inner.routes.lock();
        let route = routes.iter_mut().find(|route| {
            route.method == *method && route.path == path && route.remaining != Some(0)
        })?;
        if let Some(remaining) = route.remaining.as_mut() {
            *remaining -= 1;
        }
        Some(route.response.clone())
    }
}

impl Fetch for MockFetch {
    fn fetch(&self, request: WireRequest) -> BoxFuture<'_, anyhow::Result<WireResponse>> {
        let recorded = RecordedRequest {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
            body: request.body().clone(),
            endpoint: endpoint_of(&request).map(str::to_string),
        };
        let response = self.answer(&recorded.method, recorded.path());
        let route = format!("{} {}", recorded.method, recorded.path());
        self.inner.calls.lock().push(recorded);

        Box::pin(async move {
            let Some(response) = response else {
                anyhow::bail!("no mock route for {route}");
            };
            if let Some(delay) = response.delay {
                tokio::time::sleep(delay).await;
            }
            match response.outcome {
                Outcome::Reply {
                    status,
                    headers,
                    body,
                } => {
                    let mut out = http::Response::builder().status(status).body(body)?;
                    *out.headers_mut() = headers;
                    Ok(out)
                }
                Outcome::Fail(message) => Err(anyhow::anyhow!(message)),
            }
        })
    }
}

impl fmt::Debug for MockFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockFetch")
            .field("routes", &self.inner.routes.lock().len())
            .field("calls", &self.call_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn request(method: Method, uri: &str, body: &'static str) -> WireRequest {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .header("x-test", "1")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_routes_by_method_and_path() {
        let fetch = MockFetch::new()
            .on("GET", "/feed", MockResponse::json(200, &json!([1, 2])))
            .on("POST", "/feed", MockResponse::empty(204));

        let get = fetch
            .fetch(request(Method::GET, "https://api.test/feed?limit=2", ""))
            .await
            .unwrap();
        let post = fetch
            .fetch(request(Method::POST, "https://api.test/feed", "{}"))
            .await
            .unwrap();

        assert_eq!(get.status(), 200);
        assert_eq!(get.body().as_ref(), b"[1,2]");
        assert_eq!(post.status(), 204);
        assert!(post.body().is_empty());
    }

    #[tokio::test]
    async fn test_records_requests() {
        let fetch = MockFetch::new().on("POST", "/user", MockResponse::empty(201));
        let shared = fetch.clone();

        fetch
            .fetch(request(Method::POST, "https://api.test/user?x=1", r#"{"a":1}"#))
            .await
            .unwrap();

        let call = shared.last_call().unwrap();
        assert_eq!(shared.call_count(), 1);
        assert_eq!(call.path(), "/user");
        assert_eq!(call.query(), Some("x=1"));
        assert_eq!(call.header("x-test"), Some("1"));
        assert_eq!(call.json(), Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_once_routes_are_consumed() {
        let fetch = MockFetch::new()
            .once("GET", "/status", MockResponse::text(503, "busy"))
            .on("GET", "/status", MockResponse::json(200, &json!({"ok": true})));

        let first = fetch
            .fetch(request(Method::GET, "https://api.test/status", ""))
            .await
            .unwrap();
        let second = fetch
            .fetch(request(Method::GET, "https://api.test/status", ""))
            .await
            .unwrap();

        assert_eq!(first.status(), 503);
        assert_eq!(second.status(), 200);
    }

    #[tokio::test]
    async fn test_unrouted_and_failing_requests_error() {
        let fetch = MockFetch::new().on("GET", "/down", MockResponse::fail("connection reset"));

        let unrouted = fetch
            .fetch(request(Method::GET, "https://api.test/elsewhere", ""))
            .await
            .unwrap_err();
        let failed = fetch
            .fetch(request(Method::GET, "https://api.test/down", ""))
            .await
            .unwrap_err();

        assert!(unrouted.to_string().contains("no mock route for GET /elsewhere"));
        assert_eq!(failed.to_string(), "connection reset");
        assert_eq!(fetch.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_applied() {
        let fetch = MockFetch::new().on(
            "GET",
            "/slow",
            MockResponse::empty(200).with_delay(Duration::from_secs(5)),
        );
        let started = tokio::time::Instant::now();

        fetch
            .fetch(request(Method::GET, "https://api.test/slow", ""))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}

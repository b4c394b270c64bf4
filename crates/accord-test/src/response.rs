//! Scripted responses.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use serde_json::Value;
use std::time::Duration;

/// What a [`MockFetch`](crate::MockFetch) route answers with.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub(crate) outcome: Outcome,
    pub(crate) delay: Option<Duration>,
}

#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    Reply {
        status: u16,
        headers: HeaderMap,
        body: Bytes,
    },
    Fail(String),
}

impl MockResponse {
    /// Replies with `body` serialized as JSON.
    pub fn json(status: u16, body: &Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self::reply(status, headers, Bytes::from(body.to_string()))
    }

    /// Replies with a plain-text body.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        Self::reply(status, headers, Bytes::from(body.into()))
    }

    /// Replies with no body.
    pub fn empty(status: u16) -> Self {
        Self::reply(status, HeaderMap::new(), Bytes::new())
    }

    /// Fails the exchange as a network error would.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Fail(message.into()),
            delay: None,
        }
    }

    fn reply(status: u16, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            outcome: Outcome::Reply {
                status,
                headers,
                body,
            },
            delay: None,
        }
    }

    /// Waits `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Adds a response header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let Outcome::Reply { headers, .. } = &mut self.outcome {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }
        self
    }
}

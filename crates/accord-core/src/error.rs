//! Error types for Accord.
//!
//! Every failure a call can produce is an [`AccordError`]. Errors are never
//! encoded in the [`Response`] type: a call either resolves to a response
//! declared by the endpoint schema or fails with one of these variants.
//!
//! Callers match on [`AccordError::kind`] (or on the variant itself) rather
//! than parsing messages. The three validation outcomes are also exposed as a
//! [`Verdict`] through [`AccordError::verdict`].
//!
//! | Variant               | Raised by          | Before network I/O |
//! |-----------------------|--------------------|--------------------|
//! | `InvalidRequest`      | validation stage   | yes                |
//! | `MissingParameter`    | transport          | yes                |
//! | `Encode`              | transport          | yes                |
//! | `UnexpectedResponse`  | validation stage   | no                 |
//! | `InvalidResponse`     | validation stage   | no                 |
//! | `NonJsonBody`         | transport          | no                 |
//! | `NoContentWithBody`   | transport          | no                 |
//! | `Transport`           | transport          | no                 |
//! | `Cancelled`           | transport          | either             |
//! | `IncompleteChain`     | middleware chain   | either             |
//! | `UnknownEndpoint`     | client             | yes                |
//!
//! [`Response`]: crate::Response

use crate::status::StatusCode;
use crate::validator::ValidationIssues;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result type alias using [`AccordError`].
pub type AccordResult<T> = Result<T, AccordError>;

/// Typed discriminator of an [`AccordError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The call input failed validation.
    InvalidRequest,
    /// The server answered with a status the endpoint does not declare.
    UnexpectedResponse,
    /// The response body (or the constraint) failed validation.
    InvalidResponse,
    /// The response body could not be decoded as JSON.
    NonJsonBody,
    /// A `204 No Content` response carried a body.
    NoContentWithBody,
    /// A path placeholder had no value.
    MissingParameter,
    /// The middleware chain reached its end without a terminal handler.
    IncompleteChain,
    /// The call was aborted through its signal.
    Cancelled,
    /// The network primitive failed.
    Transport,
    /// No endpoint is registered under the requested name.
    UnknownEndpoint,
    /// The request body could not be serialized.
    Encode,
}

impl ErrorKind {
    /// Returns the snake-case name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnexpectedResponse => "unexpected_response",
            Self::InvalidResponse => "invalid_response",
            Self::NonJsonBody => "non_json_body",
            Self::NoContentWithBody => "no_content_with_body",
            Self::MissingParameter => "missing_parameter",
            Self::IncompleteChain => "incomplete_chain",
            Self::Cancelled => "cancelled",
            Self::Transport => "transport",
            Self::UnknownEndpoint => "unknown_endpoint",
            Self::Encode => "encode",
        }
    }

    /// Returns true for failures detected before any network call.
    #[must_use]
    pub const fn is_local(self) -> bool {
        matches!(
            self,
            Self::InvalidRequest | Self::MissingParameter | Self::Encode | Self::UnknownEndpoint
        )
    }

    /// Returns true for failures caused by a client/server contract mismatch.
    #[must_use]
    pub const fn is_contract_violation(self) -> bool {
        matches!(
            self,
            Self::UnexpectedResponse
                | Self::InvalidResponse
                | Self::NonJsonBody
                | Self::NoContentWithBody
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the validation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Input, output and constraint all validated.
    Passed,
    /// The input failed validation; no request was sent.
    InvalidRequest,
    /// The response status is not declared by the endpoint.
    UnexpectedResponse,
    /// The response body or the constraint failed validation.
    InvalidResponse,
}

impl Verdict {
    /// Returns the snake-case name of the verdict.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::InvalidRequest => "invalid_request",
            Self::UnexpectedResponse => "unexpected_response",
            Self::InvalidResponse => "invalid_response",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error surfaced to callers of an endpoint.
///
/// # Example
///
/// ```
/// use accord_core::{AccordError, ErrorKind};
///
/// let err = AccordError::MissingParameter {
///     endpoint: "eventDetails".into(),
///     name: "eventId".into(),
/// };
/// assert_eq!(err.kind(), ErrorKind::MissingParameter);
/// assert_eq!(
///     err.to_string(),
///     "eventDetails: missing parameter value for `eventId`"
/// );
/// ```
#[derive(Error, Debug)]
pub enum AccordError {
    /// The call input failed validation.
    #[error("{endpoint}: invalid request\n{issues}")]
    InvalidRequest {
        /// Endpoint name.
        endpoint: String,
        /// Every issue found in body, query and params.
        issues: ValidationIssues,
    },

    /// The server answered with a status the endpoint does not declare.
    #[error("{endpoint}: unexpected response with status {status}, body: {}", render_body(.body.as_ref()))]
    UnexpectedResponse {
        /// Endpoint name.
        endpoint: String,
        /// Raw status code.
        status: u16,
        /// Raw body, if any.
        body: Option<Value>,
    },

    /// The response body or the constraint failed validation.
    #[error("{endpoint}: invalid response for {status}, body: {}\n{issues}", render_body(.body.as_ref()))]
    InvalidResponse {
        /// Endpoint name.
        endpoint: String,
        /// Response status.
        status: StatusCode,
        /// Raw (unparsed) body.
        body: Option<Value>,
        /// Expected vs. received diff.
        issues: ValidationIssues,
    },

    /// The response body could not be decoded as JSON.
    #[error("{endpoint}: response with status {status} has a non-JSON body: {body}")]
    NonJsonBody {
        /// Endpoint name.
        endpoint: String,
        /// Raw status code.
        status: u16,
        /// Body decoded lossily as UTF-8.
        body: String,
    },

    /// A `204 No Content` response carried a body.
    #[error("{endpoint}: a no-content status must not carry a body, received: {body}")]
    NoContentWithBody {
        /// Endpoint name.
        endpoint: String,
        /// The parsed body.
        body: Value,
    },

    /// A path placeholder had no value.
    #[error("{endpoint}: missing parameter value for `{name}`")]
    MissingParameter {
        /// Endpoint name.
        endpoint: String,
        /// Placeholder name.
        name: String,
    },

    /// The chain reached its end without a terminal handler.
    #[error("the middleware chain did not fully handle the request")]
    IncompleteChain,

    /// The call was aborted through its signal.
    #[error("{endpoint}: request was cancelled")]
    Cancelled {
        /// Endpoint name.
        endpoint: String,
    },

    /// The network primitive failed.
    #[error("{endpoint}: transport failure: {source}")]
    Transport {
        /// Endpoint name.
        endpoint: String,
        /// Underlying error.
        source: anyhow::Error,
    },

    /// No endpoint is registered under the requested name.
    #[error("no endpoint named `{name}`")]
    UnknownEndpoint {
        /// The requested name.
        name: String,
    },

    /// The request body could not be serialized.
    #[error("{endpoint}: failed to encode request: {message}")]
    Encode {
        /// Endpoint name.
        endpoint: String,
        /// Serializer message.
        message: String,
    },
}

fn render_body(body: Option<&Value>) -> String {
    body.map_or_else(|| "<empty>".to_string(), Value::to_string)
}

impl AccordError {
    /// Returns the typed discriminator.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::UnexpectedResponse { .. } => ErrorKind::UnexpectedResponse,
            Self::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            Self::NonJsonBody { .. } => ErrorKind::NonJsonBody,
            Self::NoContentWithBody { .. } => ErrorKind::NoContentWithBody,
            Self::MissingParameter { .. } => ErrorKind::MissingParameter,
            Self::IncompleteChain => ErrorKind::IncompleteChain,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::UnknownEndpoint { .. } => ErrorKind::UnknownEndpoint,
            Self::Encode { .. } => ErrorKind::Encode,
        }
    }

    /// Returns the validation verdict carried by this error, if it is one.
    #[must_use]
    pub const fn verdict(&self) -> Option<Verdict> {
        match self {
            Self::InvalidRequest { .. } => Some(Verdict::InvalidRequest),
            Self::UnexpectedResponse { .. } => Some(Verdict::UnexpectedResponse),
            Self::InvalidResponse { .. } => Some(Verdict::InvalidResponse),
            _ => None,
        }
    }

    /// Returns true if the call was aborted.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns the endpoint name, when the error is tied to one.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::InvalidRequest { endpoint, .. }
            | Self::UnexpectedResponse { endpoint, .. }
            | Self::InvalidResponse { endpoint, .. }
            | Self::NonJsonBody { endpoint, .. }
            | Self::NoContentWithBody { endpoint, .. }
            | Self::MissingParameter { endpoint, .. }
            | Self::Cancelled { endpoint }
            | Self::Transport { endpoint, .. }
            | Self::Encode { endpoint, .. } => Some(endpoint),
            Self::UnknownEndpoint { name } => Some(name),
            Self::IncompleteChain => None,
        }
    }

    /// Returns the raw response status, when the error carries one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedResponse { status, .. } | Self::NonJsonBody { status, .. } => {
                Some(*status)
            }
            Self::InvalidResponse { status, .. } => Some(status.as_u16()),
            Self::NoContentWithBody { .. } => Some(StatusCode::NoContent.as_u16()),
            _ => None,
        }
    }

    /// Builds a transport failure from any error.
    pub fn transport(endpoint: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }
}

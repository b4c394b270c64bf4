//! The closed set of status codes an endpoint contract may declare.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A status code an endpoint schema can map to an output shape.
///
/// The set is closed: any status outside it is never a valid [`Response`]
/// and is reported as an unexpected response by the validation stage.
///
/// `204 No Content` is special-cased: it must never carry a body.
///
/// [`Response`]: crate::Response
///
/// # Example
///
/// ```
/// use accord_core::StatusCode;
///
/// assert_eq!(StatusCode::from_u16(201), Some(StatusCode::Created));
/// assert_eq!(StatusCode::from_u16(418), None);
/// assert!(StatusCode::NoContent.is_no_content());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum StatusCode {
    /// 200 OK
    Ok = 200,
    /// 201 Created
    Created = 201,
    /// 204 No Content
    NoContent = 204,
    /// 400 Bad Request
    BadRequest = 400,
    /// 401 Unauthorized
    Unauthorized = 401,
    /// 403 Forbidden
    Forbidden = 403,
    /// 404 Not Found
    NotFound = 404,
    /// 429 Too Many Requests
    TooManyRequests = 429,
    /// 500 Internal Server Error
    InternalServerError = 500,
}

impl StatusCode {
    /// Returns the status code matching `code`, if it belongs to the closed set.
    #[must_use]
    pub const fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(Self::Ok),
            201 => Some(Self::Created),
            204 => Some(Self::NoContent),
            400 => Some(Self::BadRequest),
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            404 => Some(Self::NotFound),
            429 => Some(Self::TooManyRequests),
            500 => Some(Self::InternalServerError),
            _ => None,
        }
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns true for `204 No Content`.
    #[must_use]
    pub const fn is_no_content(self) -> bool {
        matches!(self, Self::NoContent)
    }

    /// Returns true for 2xx codes.
    #[must_use]
    pub const fn is_success(self) -> bool {
        (self as u16) < 300
    }

    /// Returns the canonical reason phrase.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Created => "Created",
            Self::NoContent => "No Content",
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::TooManyRequests => "Too Many Requests",
            Self::InternalServerError => "Internal Server Error",
        }
    }

    /// Returns every status code in ascending order.
    #[must_use]
    pub const fn all() -> [StatusCode; 9] {
        [
            Self::Ok,
            Self::Created,
            Self::NoContent,
            Self::BadRequest,
            Self::Unauthorized,
            Self::Forbidden,
            Self::NotFound,
            Self::TooManyRequests,
            Self::InternalServerError,
        ]
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason())
    }
}

impl From<StatusCode> for u16 {
    fn from(status: StatusCode) -> Self {
        status.as_u16()
    }
}

impl TryFrom<u16> for StatusCode {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::from_u16(code).ok_or_else(|| format!("status code {code} is not part of the contract"))
    }
}

impl From<StatusCode> for http::StatusCode {
    fn from(status: StatusCode) -> Self {
        match status {
            StatusCode::Ok => Self::OK,
            StatusCode::Created => Self::CREATED,
            StatusCode::NoContent => Self::NO_CONTENT,
            StatusCode::BadRequest => Self::BAD_REQUEST,
            StatusCode::Unauthorized => Self::UNAUTHORIZED,
            StatusCode::Forbidden => Self::FORBIDDEN,
            StatusCode::NotFound => Self::NOT_FOUND,
            StatusCode::TooManyRequests => Self::TOO_MANY_REQUESTS,
            StatusCode::InternalServerError => Self::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_every_code() {
        for status in StatusCode::all() {
            assert_eq!(StatusCode::from_u16(status.as_u16()), Some(status));
        }
    }

    #[test]
    fn test_rejects_codes_outside_contract() {
        assert_eq!(StatusCode::from_u16(202), None);
        assert_eq!(StatusCode::from_u16(302), None);
        assert_eq!(StatusCode::from_u16(503), None);
        assert!(StatusCode::try_from(418).is_err());
    }

    #[test]
    fn test_ordering_matches_numeric() {
        let all = StatusCode::all();
        assert!(all.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_http_conversion() {
        let code: http::StatusCode = StatusCode::TooManyRequests.into();
        assert_eq!(code.as_u16(), 429);
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::NoContent.to_string(), "204 No Content");
    }

    #[test]
    fn test_success_classification() {
        assert!(StatusCode::Created.is_success());
        assert!(!StatusCode::NotFound.is_success());
    }

    proptest::proptest! {
        #[test]
        fn prop_from_u16_accepts_exactly_the_declared_codes(code in 0u16..1000) {
            let declared = StatusCode::all().into_iter().any(|s| s.as_u16() == code);
            match StatusCode::from_u16(code) {
                Some(status) => {
                    proptest::prop_assert!(declared);
                    proptest::prop_assert_eq!(status.as_u16(), code);
                }
                None => proptest::prop_assert!(!declared),
            }
        }
    }
}

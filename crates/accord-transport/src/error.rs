//! Transport setup errors.

use thiserror::Error;

/// Errors raised while building an [`HttpTransport`](crate::HttpTransport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The base URL cannot be used.
    #[error("Invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl {
        /// The URL as given.
        url: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A default header has an invalid name or value.
    #[error("Invalid header `{name}`: {reason}")]
    InvalidHeader {
        /// The header name as given.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The HTTP client could not be created.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// Result type for transport setup.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::InvalidBaseUrl {
            url: "api".to_string(),
            reason: "URL must be absolute".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid base URL `api`: URL must be absolute");
    }
}

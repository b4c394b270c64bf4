//! Client construction errors.

use thiserror::Error;

/// Errors raised while building an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The builder was given no API-level middleware.
    #[error("an API client needs at least one middleware")]
    NoMiddleware,
}

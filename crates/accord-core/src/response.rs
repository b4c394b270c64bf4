//! Call responses.

use crate::status::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The result of a successful call: a declared status and its payload.
///
/// `data` is `Some` exactly when the endpoint declares a body for `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response status.
    pub status: StatusCode,
    /// Validated payload, absent for no-content statuses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    /// Creates a response.
    #[must_use]
    pub const fn new(status: StatusCode, data: Option<Value>) -> Self {
        Self { status, data }
    }

    /// A response with a body.
    #[must_use]
    pub const fn with_data(status: StatusCode, data: Value) -> Self {
        Self::new(status, Some(data))
    }

    /// A response without a body.
    #[must_use]
    pub const fn empty(status: StatusCode) -> Self {
        Self::new(status, None)
    }

    /// Decodes the payload into `T`.
    ///
    /// Returns `Ok(None)` when there is no payload.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the payload does not fit `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.data.clone().map(serde_json::from_value).transpose()
    }

    /// Converts into a [`TypedResponse`].
    ///
    /// # Errors
    ///
    /// Returns the serde error if the payload does not fit `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<TypedResponse<T>, serde_json::Error> {
        let data = self.data.map(serde_json::from_value).transpose()?;
        Ok(TypedResponse {
            status: self.status,
            data,
        })
    }
}

/// A [`Response`] whose payload has been decoded into `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedResponse<T> {
    /// Response status.
    pub status: StatusCode,
    /// Decoded payload.
    pub data: Option<T>,
}

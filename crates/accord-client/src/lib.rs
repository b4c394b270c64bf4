//! # Accord Client
//!
//! Turns a map of endpoint schemas and an API-level middleware chain into
//! one callable per endpoint.
//!
//! ```text
//! EndpointFn::call(input)
//!   └─▶ RequestContext { endpoint, schema, body, query, params, signal }
//!         └─▶ stage 1 ─▶ stage 2 ─▶ … ─▶ transport
//! ```
//!
//! The factory is pure wiring. Validation, telemetry and the network call
//! are stages of the chain it is given.

#![doc(html_root_url = "https://docs.rs/accord-client/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod endpoint;
mod error;

pub use client::{ApiClient, ApiClientBuilder};
pub use endpoint::{EndpointFn, TypedEndpoint};
pub use error::ClientError;

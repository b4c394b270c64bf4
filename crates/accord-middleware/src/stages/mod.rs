//! Built-in middleware stages.
//!
//! API-level stages operate on [`RequestContext`](accord_core::RequestContext)
//! and [`Response`](accord_core::Response):
//!
//! - [`ValidationMiddleware`]: input, response and constraint validation
//! - [`TelemetryMiddleware`]: one `tracing` span per call
//!
//! Wire-level stages operate on [`WireRequest`](accord_core::wire::WireRequest)
//! and [`WireResponse`](accord_core::wire::WireResponse):
//!
//! - [`RequestIdMiddleware`]: `x-request-id` header
//! - [`AuthMiddleware`]: bearer token from a [`TokenProvider`]
//! - [`WireLoggingMiddleware`]: method, URL, status and duration

pub mod auth;
pub mod request_id;
pub mod telemetry;
pub mod validation;
pub mod wire_logging;

pub use auth::{AuthMiddleware, StaticToken, TokenProvider};
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
pub use telemetry::{CallTelemetry, TelemetryBuilder, TelemetryMiddleware};
pub use validation::ValidationMiddleware;
pub use wire_logging::WireLoggingMiddleware;

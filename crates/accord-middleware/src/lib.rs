//! # Accord Middleware
//!
//! Middleware chains for Accord.
//!
//! One generic mechanism drives two chains:
//!
//! ```text
//! API level:   RequestContext → [Telemetry] → [Validation] → ... → HttpTransport
//!                                                                      │
//! Wire level:  WireRequest → [RequestId] → [Auth] → [WireLogging] → Fetch
//! ```
//!
//! The API-level chain runs the stages a client is built with, ending in the
//! HTTP transport. The transport runs its own wire-level chain around the
//! network primitive.
//!
//! ## Built-in stages
//!
//! | Stage                     | Level | Purpose                                    |
//! |---------------------------|-------|--------------------------------------------|
//! | [`ValidationMiddleware`]  | API   | Validate input, response and constraint    |
//! | [`TelemetryMiddleware`]   | API   | Span per call, outcome and duration logged |
//! | [`RequestIdMiddleware`]   | Wire  | Attach an `x-request-id` header (UUID v7)  |
//! | [`AuthMiddleware`]        | Wire  | Attach a bearer token from a provider      |
//! | [`WireLoggingMiddleware`] | Wire  | Log method, URL, status and duration       |
//!
//! [`ValidationMiddleware`]: stages::ValidationMiddleware
//! [`TelemetryMiddleware`]: stages::TelemetryMiddleware
//! [`RequestIdMiddleware`]: stages::RequestIdMiddleware
//! [`AuthMiddleware`]: stages::AuthMiddleware
//! [`WireLoggingMiddleware`]: stages::WireLoggingMiddleware

#![doc(html_root_url = "https://docs.rs/accord-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod middleware;
pub mod stages;

pub use chain::{compose, BoxedHandler, BoxedMiddleware, Chain, ChainBuilder};
pub use middleware::{FnMiddleware, Handler, Middleware, Next, Respond};

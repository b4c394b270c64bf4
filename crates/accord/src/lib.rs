//! # Accord
//!
//! **Contract-checked HTTP API clients**
//!
//! Accord turns a declarative map of endpoint schemas into callable
//! functions. Every call is checked on the way out and on the way back:
//!
//! - **Input validation**: body, query and path parameters are validated
//!   (and coerced) before any request leaves the process
//! - **Response validation**: the status must be declared, and the data must
//!   match the validator declared for that status
//! - **Composable stages**: API-level and wire-level middleware chains
//! - **Structured logging**: `tracing` spans per call plus a pluggable
//!   failure logger
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use accord::prelude::*;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("accord.toml")?
//!     .with_env_prefix("ACCORD")
//!     .load()?;
//!
//! let endpoints = EndpointMap::new().endpoint(
//!     "getUser",
//!     EndpointSchema::get("/users/:id")
//!         .params(Shape::object(vec![("id", Shape::string())]))
//!         .returns(StatusCode::Ok, Shape::object(vec![("id", Shape::string())]))
//!         .build()?,
//! );
//!
//! let accord = Accord::from_config(config)?;
//! accord.init_logging()?;
//! let client = accord.client(endpoints)?;
//!
//! let user = client
//!     .call("getUser", CallInput::new().params(json!({"id": "u1"})))
//!     .await?;
//! println!("{:?}", user.data);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! call → Telemetry → Validation → HttpTransport ─→ RequestId → Auth → WireLogging → Fetch
//!                                                                                   ↓
//! Response ← Validation ← interpret ←──────────────────────────────────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/accord/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod setup;

pub use setup::{Accord, SetupError};

// Re-export core types
pub use accord_core as core;

// Re-export middleware types
pub use accord_middleware as middleware;

// Re-export transport types
pub use accord_transport as transport;

// Re-export client types
pub use accord_client as client;

// Re-export telemetry types
pub use accord_telemetry as telemetry;

// Re-export configuration types
pub use accord_config as config;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use accord::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Accord, SetupError};

    pub use accord_core::{
        AbortController, AbortSignal, AccordError, AccordResult, AsyncOutcome, CallInput,
        Constraint, EndpointMap, EndpointSchema, ErrorKind, OutcomeExt, Response, Shape,
        StatusCode, Typed, TypedResponse, ValidatedInput, ValidationIssue, ValidationIssues,
        Validator,
    };

    // Re-export middleware types
    pub use accord_middleware::stages::{
        AuthMiddleware, RequestIdMiddleware, StaticToken, TelemetryMiddleware, TokenProvider,
        ValidationMiddleware, WireLoggingMiddleware,
    };
    pub use accord_middleware::{Chain, Handler, Middleware, Next};

    // Re-export transport and client types
    pub use accord_client::{ApiClient, EndpointFn, TypedEndpoint};
    pub use accord_transport::{Fetch, HttpTransport, ReqwestFetch};

    // Re-export configuration and logging types
    pub use accord_config::{AccordConfig, ConfigLoader};
    pub use accord_telemetry::{fields, LogLevel, LogRecord, LogSink, Logger};
}

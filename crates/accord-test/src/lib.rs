//! # Accord Test
//!
//! Test utilities for Accord clients. Calls run through the real middleware
//! chains and transport; only the network is replaced.
//!
//! - [`MockFetch`]: a [`Fetch`](accord_transport::Fetch) answering from a
//!   route table and recording every request
//! - [`MockResponse`]: JSON, text, empty or failing replies, optionally
//!   delayed
//! - [`MemorySink`]: captures [`Logger`](accord_telemetry::Logger) records
//! - [`fixtures`]: a ready-made user service endpoint map
//!
//! ## Example
//!
//! ```
//! use accord_core::{CallInput, EndpointSchema, RequestContext, Shape, StatusCode};
//! use accord_telemetry::Logger;
//! use accord_test::{MemorySink, MockFetch, MockResponse};
//! use accord_transport::HttpTransport;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! use accord_middleware::Handler;
//!
//! let fetch = MockFetch::new().on("GET", "/ping", MockResponse::json(200, &json!("pong")));
//! let logs = MemorySink::new();
//! let transport = HttpTransport::builder("https://api.test")
//!     .fetch(fetch.clone())
//!     .logger(Logger::new().with_sink(logs.clone()))
//!     .build()
//!     .unwrap();
//!
//! let schema = Arc::new(
//!     EndpointSchema::get("/ping")
//!         .returns(StatusCode::Ok, Shape::string())
//!         .build()
//!         .unwrap(),
//! );
//! let ctx = RequestContext::new("ping", schema, CallInput::new()).unwrap();
//! let response = transport.call(ctx).await.unwrap();
//!
//! assert_eq!(response.data, Some(json!("pong")));
//! assert_eq!(fetch.last_call().unwrap().path(), "/ping");
//! assert!(logs.is_empty());
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/accord-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod fetch;
pub mod fixtures;
mod response;
mod sink;

pub use fetch::{MockFetch, RecordedRequest};
pub use response::MockResponse;
pub use sink::MemorySink;

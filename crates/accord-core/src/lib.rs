//! # Accord Core
//!
//! Core types shared by every Accord crate.
//!
//! An Accord client is driven by static [`EndpointSchema`] values: each one
//! describes the accepted input (body, query and path parameters), the
//! response shape for every [`StatusCode`] the server may answer with, an
//! optional cross-field [`Constraint`], and the HTTP binding.
//!
//! This crate provides:
//!
//! - [`StatusCode`] - the closed set of status codes a contract may declare
//! - [`Validator`] - parse an untyped JSON value into a validated one, with
//!   [`Shape`], [`Typed`], [`FnValidator`] and [`AsyncFnValidator`] implementations
//! - [`EndpointSchema`] - the static description of one operation
//! - [`RequestContext`] / [`CallInput`] - the per-call bundle threaded through middleware
//! - [`Response`] - a status code plus an optional JSON payload
//! - [`AbortController`] / [`AbortSignal`] - call cancellation
//! - [`AccordError`] - the error taxonomy surfaced to callers
//! - [`OutcomeExt`] / [`AsyncOutcome`] - chainable helpers over `Result`

#![doc(html_root_url = "https://docs.rs/accord-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod abort;
mod context;
mod error;
pub mod outcome;
mod response;
pub mod schema;
pub mod shape;
mod status;
pub mod url_param;
pub mod validator;
pub mod wire;

pub use abort::{AbortController, AbortSignal, Aborted};
pub use context::{CallInput, RequestContext, RequestId};
pub use error::{AccordError, AccordResult, ErrorKind, Verdict};
pub use outcome::{AsyncOutcome, BoxFuture, OutcomeExt};
pub use response::{Response, TypedResponse};
pub use schema::{
    Constraint, EndpointMap, EndpointSchema, EndpointSchemaBuilder, FieldSpec, HttpBinding,
    InputSpec, OutputSpec, Outputs, SchemaError, ValidatedInput,
};
pub use shape::Shape;
pub use status::StatusCode;
pub use url_param::ToUrlParameter;
pub use validator::{
    AsyncFnValidator, FnValidator, SharedValidator, Typed, ValidationIssue, ValidationIssues,
    Validator,
};

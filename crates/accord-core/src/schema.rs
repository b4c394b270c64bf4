//! Endpoint schemas.
//!
//! An [`EndpointSchema`] is the static description of one operation:
//!
//! - [`InputSpec`]: validators for `body`, `query` and `params`
//! - [`Outputs`]: the response shape for each [`StatusCode`] the server may
//!   answer with, either a body validator or [`OutputSpec::NoBody`]
//! - an optional [`Constraint`] cross-checking validated input and output
//! - the [`HttpBinding`]: method and `:name` path template
//!
//! Schemas are built once, validated at build time, and shared behind an
//! `Arc` by every call.
//!
//! # Example
//!
//! ```
//! use accord_core::{EndpointSchema, Shape, StatusCode};
//! use http::Method;
//!
//! let create_user = EndpointSchema::builder(Method::POST, "/user")
//!     .returns(
//!         StatusCode::Created,
//!         Shape::object(vec![
//!             ("id", Shape::string().required()),
//!             ("handle", Shape::string().required()),
//!         ]),
//!     )
//!     .no_content(StatusCode::NoContent)
//!     .build()
//!     .unwrap();
//!
//! assert!(create_user.output_for(StatusCode::Created).is_some());
//! assert!(create_user.output_for(StatusCode::Ok).is_none());
//!
//! let invalid = EndpointSchema::builder(Method::GET, "/feed")
//!     .body(Shape::any())
//!     .returns(StatusCode::Ok, Shape::any())
//!     .build();
//! assert!(invalid.is_err());
//! ```

use crate::response::Response;
use crate::status::StatusCode;
use crate::validator::{SharedValidator, Validator};
use http::Method;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Errors raised while building a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The schema declares no output at all.
    #[error("{method} {path}: at least one output must be declared")]
    NoOutputs {
        /// HTTP method.
        method: Method,
        /// Path template.
        path: String,
    },

    /// A body input was declared for a method that cannot carry one.
    #[error("{method} {path}: a {method} request cannot carry a body")]
    BodyNotAllowed {
        /// HTTP method.
        method: Method,
        /// Path template.
        path: String,
    },

    /// The path template is malformed.
    #[error("invalid path template `{path}`: {reason}")]
    InvalidPathTemplate {
        /// Path template.
        path: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// One input field (body, query or params) and its validator.
#[derive(Clone)]
pub struct FieldSpec {
    validator: SharedValidator,
    optional: bool,
}

impl FieldSpec {
    /// A field that must be supplied.
    pub fn required(validator: impl Validator + 'static) -> Self {
        Self {
            validator: Arc::new(validator),
            optional: false,
        }
    }

    /// A field that may be omitted.
    pub fn optional(validator: impl Validator + 'static) -> Self {
        Self {
            validator: Arc::new(validator),
            optional: true,
        }
    }

    /// Returns the validator.
    #[must_use]
    pub fn validator(&self) -> &SharedValidator {
        &self.validator
    }

    /// Returns `true` if the field may be omitted.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("expects", &self.validator.describe())
            .field("optional", &self.optional)
            .finish()
    }
}

/// Validators for the three input fields. Absent entries are not checked.
#[derive(Debug, Clone, Default)]
pub struct InputSpec {
    /// JSON body.
    pub body: Option<FieldSpec>,
    /// Query parameters.
    pub query: Option<FieldSpec>,
    /// Path parameters.
    pub params: Option<FieldSpec>,
}

impl InputSpec {
    /// Returns `true` if no input field is declared.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.body.is_none() && self.query.is_none() && self.params.is_none()
    }
}

/// The declared shape of a response for one status code.
#[derive(Clone)]
pub enum OutputSpec {
    /// The response carries a body validated by this validator.
    Body(SharedValidator),
    /// The response never carries a body.
    NoBody,
}

impl OutputSpec {
    /// Wraps a body validator.
    pub fn body(validator: impl Validator + 'static) -> Self {
        Self::Body(Arc::new(validator))
    }

    /// Returns `true` for [`OutputSpec::NoBody`].
    #[must_use]
    pub const fn is_no_body(&self) -> bool {
        matches!(self, Self::NoBody)
    }
}

impl fmt::Debug for OutputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body(validator) => f.debug_tuple("Body").field(&validator.describe()).finish(),
            Self::NoBody => f.write_str("NoBody"),
        }
    }
}

/// Output shapes keyed by status code, one slot per [`StatusCode`].
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    ok: Option<OutputSpec>,
    created: Option<OutputSpec>,
    no_content: Option<OutputSpec>,
    bad_request: Option<OutputSpec>,
    unauthorized: Option<OutputSpec>,
    forbidden: Option<OutputSpec>,
    not_found: Option<OutputSpec>,
    too_many_requests: Option<OutputSpec>,
    internal_server_error: Option<OutputSpec>,
}

impl Outputs {
    const fn slot(&self, status: StatusCode) -> &Option<OutputSpec> {
        match status {
            StatusCode::Ok => &self.ok,
            StatusCode::Created => &self.created,
            StatusCode::NoContent => &self.no_content,
            StatusCode::BadRequest => &self.bad_request,
            StatusCode::Unauthorized => &self.unauthorized,
            StatusCode::Forbidden => &self.forbidden,
            StatusCode::NotFound => &self.not_found,
            StatusCode::TooManyRequests => &self.too_many_requests,
            StatusCode::InternalServerError => &self.internal_server_error,
        }
    }

    fn slot_mut(&mut self, status: StatusCode) -> &mut Option<OutputSpec> {
        match status {
            StatusCode::Ok => &mut self.ok,
            StatusCode::Created => &mut self.created,
            StatusCode::NoContent => &mut self.no_content,
            StatusCode::BadRequest => &mut self.bad_request,
            StatusCode::Unauthorized => &mut self.unauthorized,
            StatusCode::Forbidden => &mut self.forbidden,
            StatusCode::NotFound => &mut self.not_found,
            StatusCode::TooManyRequests => &mut self.too_many_requests,
            StatusCode::InternalServerError => &mut self.internal_server_error,
        }
    }

    /// Returns the output declared for `status`.
    #[must_use]
    pub fn get(&self, status: StatusCode) -> Option<&OutputSpec> {
        self.slot(status).as_ref()
    }

    /// Declares the output for `status`, replacing any previous declaration.
    pub fn insert(&mut self, status: StatusCode, spec: OutputSpec) {
        *self.slot_mut(status) = Some(spec);
    }

    /// Returns the declared status codes in ascending order.
    #[must_use]
    pub fn statuses(&self) -> Vec<StatusCode> {
        StatusCode::all()
            .into_iter()
            .filter(|status| self.slot(*status).is_some())
            .collect()
    }

    /// Returns `true` if no output is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        StatusCode::all().iter().all(|status| self.slot(*status).is_none())
    }
}

/// The validated input handed to a [`Constraint`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedInput {
    /// Validated body.
    pub body: Option<Value>,
    /// Validated query parameters.
    pub query: Option<Value>,
    /// Validated path parameters.
    pub params: Option<Value>,
}

type ConstraintFn = dyn Fn(&ValidatedInput, &Response) -> bool + Send + Sync;

/// A cross-field check between validated input and validated output.
///
/// Evaluated only after both sides validate individually.
#[derive(Clone)]
pub struct Constraint {
    name: String,
    check: Arc<ConstraintFn>,
}

impl Constraint {
    /// Wraps a check function.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&ValidatedInput, &Response) -> bool + Send + Sync + 'static,
    {
        Self::named("constraint", check)
    }

    /// Wraps a check function under a descriptive name.
    pub fn named<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&ValidatedInput, &Response) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the check.
    #[must_use]
    pub fn holds(&self, input: &ValidatedInput, output: &Response) -> bool {
        (self.check)(input, output)
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint").field("name", &self.name).finish()
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").expect("placeholder regex is valid")
    })
}

/// HTTP method and path template of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBinding {
    /// HTTP method.
    pub method: Method,
    /// Path template with `:name` placeholders.
    pub path: String,
}

impl HttpBinding {
    /// Creates a binding.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// Returns `false` for methods that never carry a body (`GET`, `HEAD`).
    #[must_use]
    pub fn allows_body(&self) -> bool {
        self.method != Method::GET && self.method != Method::HEAD
    }

    /// Returns the placeholder names in template order.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        placeholder_regex()
            .captures_iter(&self.path)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Replaces each `:name` placeholder with `resolve(name)`.
    ///
    /// Stops at the first placeholder for which `resolve` fails.
    pub fn interpolate<E>(
        &self,
        mut resolve: impl FnMut(&str) -> Result<String, E>,
    ) -> Result<String, E> {
        let mut out = String::with_capacity(self.path.len());
        let mut last = 0;
        for caps in placeholder_regex().captures_iter(&self.path) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&self.path[last..whole.start()]);
            out.push_str(&resolve(name.as_str())?);
            last = whole.end();
        }
        out.push_str(&self.path[last..]);
        Ok(out)
    }

    fn check_template(&self) -> Result<(), SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidPathTemplate {
            path: self.path.clone(),
            reason: reason.to_string(),
        };

        if !self.path.starts_with('/') {
            return Err(invalid("must start with `/`"));
        }

        let names = self.placeholders();
        if names.len() != self.path.matches(':').count() {
            return Err(invalid("`:` must introduce an identifier placeholder"));
        }
        for (idx, name) in names.iter().enumerate() {
            if names[..idx].contains(name) {
                return Err(invalid(&format!("placeholder `{name}` appears twice")));
            }
        }
        Ok(())
    }
}

impl fmt::Display for HttpBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Static description of one endpoint.
#[derive(Debug, Clone)]
pub struct EndpointSchema {
    input: InputSpec,
    outputs: Outputs,
    constraint: Option<Constraint>,
    http: HttpBinding,
    description: Option<String>,
}

impl EndpointSchema {
    /// Starts building a schema for `method path`.
    pub fn builder(method: Method, path: impl Into<String>) -> EndpointSchemaBuilder {
        EndpointSchemaBuilder {
            input: InputSpec::default(),
            outputs: Outputs::default(),
            constraint: None,
            http: HttpBinding::new(method, path),
            description: None,
        }
    }

    /// Starts a `GET` schema.
    pub fn get(path: impl Into<String>) -> EndpointSchemaBuilder {
        Self::builder(Method::GET, path)
    }

    /// Starts a `POST` schema.
    pub fn post(path: impl Into<String>) -> EndpointSchemaBuilder {
        Self::builder(Method::POST, path)
    }

    /// Starts a `PUT` schema.
    pub fn put(path: impl Into<String>) -> EndpointSchemaBuilder {
        Self::builder(Method::PUT, path)
    }

    /// Starts a `PATCH` schema.
    pub fn patch(path: impl Into<String>) -> EndpointSchemaBuilder {
        Self::builder(Method::PATCH, path)
    }

    /// Starts a `DELETE` schema.
    pub fn delete(path: impl Into<String>) -> EndpointSchemaBuilder {
        Self::builder(Method::DELETE, path)
    }

    /// Returns the input validators.
    #[must_use]
    pub const fn input(&self) -> &InputSpec {
        &self.input
    }

    /// Returns the output table.
    #[must_use]
    pub const fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Returns the output declared for `status`.
    #[must_use]
    pub fn output_for(&self, status: StatusCode) -> Option<&OutputSpec> {
        self.outputs.get(status)
    }

    /// Returns the constraint, if any.
    #[must_use]
    pub const fn constraint(&self) -> Option<&Constraint> {
        self.constraint.as_ref()
    }

    /// Returns the HTTP binding.
    #[must_use]
    pub const fn http(&self) -> &HttpBinding {
        &self.http
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.http.method
    }

    /// Returns the path template.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.http.path
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Builder for [`EndpointSchema`].
#[derive(Debug)]
#[must_use = "builders do nothing unless built"]
pub struct EndpointSchemaBuilder {
    input: InputSpec,
    outputs: Outputs,
    constraint: Option<Constraint>,
    http: HttpBinding,
    description: Option<String>,
}

impl EndpointSchemaBuilder {
    /// Requires a body validated by `validator`.
    pub fn body(mut self, validator: impl Validator + 'static) -> Self {
        self.input.body = Some(FieldSpec::required(validator));
        self
    }

    /// Accepts an optional body validated by `validator`.
    pub fn optional_body(mut self, validator: impl Validator + 'static) -> Self {
        self.input.body = Some(FieldSpec::optional(validator));
        self
    }

    /// Requires query parameters validated by `validator`.
    pub fn query(mut self, validator: impl Validator + 'static) -> Self {
        self.input.query = Some(FieldSpec::required(validator));
        self
    }

    /// Accepts optional query parameters validated by `validator`.
    pub fn optional_query(mut self, validator: impl Validator + 'static) -> Self {
        self.input.query = Some(FieldSpec::optional(validator));
        self
    }

    /// Requires path parameters validated by `validator`.
    pub fn params(mut self, validator: impl Validator + 'static) -> Self {
        self.input.params = Some(FieldSpec::required(validator));
        self
    }

    /// Accepts optional path parameters validated by `validator`.
    pub fn optional_params(mut self, validator: impl Validator + 'static) -> Self {
        self.input.params = Some(FieldSpec::optional(validator));
        self
    }

    /// Replaces the whole input declaration.
    pub fn input(mut self, input: InputSpec) -> Self {
        self.input = input;
        self
    }

    /// Declares the output for `status`.
    pub fn output(mut self, status: StatusCode, spec: OutputSpec) -> Self {
        self.outputs.insert(status, spec);
        self
    }

    /// Declares that `status` carries a body validated by `validator`.
    pub fn returns(self, status: StatusCode, validator: impl Validator + 'static) -> Self {
        self.output(status, OutputSpec::body(validator))
    }

    /// Declares that `status` carries no body.
    pub fn no_content(self, status: StatusCode) -> Self {
        self.output(status, OutputSpec::NoBody)
    }

    /// Sets the cross-field constraint.
    pub fn constraint<F>(mut self, check: F) -> Self
    where
        F: Fn(&ValidatedInput, &Response) -> bool + Send + Sync + 'static,
    {
        self.constraint = Some(Constraint::new(check));
        self
    }

    /// Sets a named cross-field constraint.
    pub fn named_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Sets a free-form description.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Validates and builds the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if no output is declared, if a body is
    /// declared for `GET`/`HEAD`, or if the path template is malformed.
    pub fn build(self) -> Result<EndpointSchema, SchemaError> {
        if self.outputs.is_empty() {
            return Err(SchemaError::NoOutputs {
                method: self.http.method,
                path: self.http.path,
            });
        }
        if self.input.body.is_some() && !self.http.allows_body() {
            return Err(SchemaError::BodyNotAllowed {
                method: self.http.method,
                path: self.http.path,
            });
        }
        self.http.check_template()?;

        Ok(EndpointSchema {
            input: self.input,
            outputs: self.outputs,
            constraint: self.constraint,
            http: self.http,
            description: self.description,
        })
    }
}

/// Insertion-ordered map of endpoint name to schema.
#[derive(Debug, Clone, Default)]
pub struct EndpointMap {
    entries: IndexMap<String, Arc<EndpointSchema>>,
}

impl EndpointMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an endpoint, replacing any previous one with the same name.
    #[must_use]
    pub fn endpoint(mut self, name: impl Into<String>, schema: EndpointSchema) -> Self {
        self.insert(name, schema);
        self
    }

    /// Adds an endpoint, replacing any previous one with the same name.
    pub fn insert(&mut self, name: impl Into<String>, schema: EndpointSchema) {
        self.entries.insert(name.into(), Arc::new(schema));
    }

    /// Returns the schema registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<EndpointSchema>> {
        self.entries.get(name)
    }

    /// Iterates over endpoints in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<EndpointSchema>)> {
        self.entries.iter().map(|(name, schema)| (name.as_str(), schema))
    }

    /// Returns the endpoint names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no endpoint is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, EndpointSchema)> for EndpointMap {
    fn from_iter<I: IntoIterator<Item = (S, EndpointSchema)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, schema) in iter {
            map.insert(name, schema);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;
    use serde_json::json;

    #[test]
    fn test_requires_outputs() {
        let err = EndpointSchema::get("/feed").build().unwrap_err();
        assert!(matches!(err, SchemaError::NoOutputs { .. }));
    }

    #[test]
    fn test_rejects_body_on_get_and_head() {
        for method in [Method::GET, Method::HEAD] {
            let err = EndpointSchema::builder(method, "/x")
                .body(Shape::any())
                .returns(StatusCode::Ok, Shape::any())
                .build()
                .unwrap_err();
            assert!(matches!(err, SchemaError::BodyNotAllowed { .. }));
        }
    }

    #[test]
    fn test_path_template_checks() {
        let ok = EndpointSchema::get("/event/details/:eventId/:part_2")
            .returns(StatusCode::Ok, Shape::any())
            .build()
            .unwrap();
        assert_eq!(ok.http().placeholders(), vec!["eventId", "part_2"]);

        for path in ["event", "/a/:1x", "/a/:", "/a/:id/b/:id"] {
            let err = EndpointSchema::get(path)
                .returns(StatusCode::Ok, Shape::any())
                .build()
                .unwrap_err();
            assert!(
                matches!(err, SchemaError::InvalidPathTemplate { .. }),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn test_interpolate_stops_at_first_failure() {
        let binding = HttpBinding::new(Method::GET, "/a/:x/b/:y");
        let path: Result<_, String> = binding.interpolate(|name| Ok(name.to_uppercase()));
        assert_eq!(path.unwrap(), "/a/X/b/Y");

        let mut seen = Vec::new();
        let err = binding.interpolate(|name| {
            seen.push(name.to_string());
            Err::<String, _>(name.to_string())
        });
        assert_eq!(err.unwrap_err(), "x");
        assert_eq!(seen, vec!["x"]);
    }

    #[test]
    fn test_outputs_table() {
        let schema = EndpointSchema::delete("/user/:id")
            .no_content(StatusCode::NoContent)
            .returns(StatusCode::NotFound, Shape::any())
            .build()
            .unwrap();
        assert_eq!(
            schema.outputs().statuses(),
            vec![StatusCode::NoContent, StatusCode::NotFound]
        );
        assert!(schema.output_for(StatusCode::NoContent).unwrap().is_no_body());
        assert!(schema.output_for(StatusCode::Ok).is_none());
    }

    #[test]
    fn test_constraint_sees_input_and_output() {
        let schema = EndpointSchema::post("/echo")
            .body(Shape::any())
            .returns(StatusCode::Ok, Shape::any())
            .constraint(|input, output| input.body == output.data)
            .build()
            .unwrap();
        let constraint = schema.constraint().unwrap();
        let input = ValidatedInput {
            body: Some(json!(1)),
            ..ValidatedInput::default()
        };
        assert!(constraint.holds(&input, &Response::new(StatusCode::Ok, Some(json!(1)))));
        assert!(!constraint.holds(&input, &Response::new(StatusCode::Ok, Some(json!(2)))));
    }

    #[test]
    fn test_endpoint_map_keeps_insertion_order() {
        let any = || EndpointSchema::get("/").returns(StatusCode::Ok, Shape::any()).build().unwrap();
        let map = EndpointMap::new()
            .endpoint("zeta", any())
            .endpoint("alpha", any())
            .endpoint("mid", any());
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert!(map.get("alpha").is_some());
        assert!(map.get("beta").is_none());
    }
}

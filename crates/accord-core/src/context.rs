//! Per-call input and context.
//!
//! Callers describe a call with a [`CallInput`]. The client turns it into a
//! [`RequestContext`], which travels through the API-level middleware chain.
//! Middleware may replace `body`, `query` and `params` (the validation stage
//! swaps in validated values) but can never change which endpoint the
//! context belongs to.

use crate::abort::AbortSignal;
use crate::error::{AccordError, AccordResult};
use crate::schema::EndpointSchema;
use crate::url_param::ToUrlParameter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Unique identifier of one call.
///
/// Uses UUID v7, so identifiers sort by creation time.
///
/// # Example
///
/// ```
/// use accord_core::RequestId;
///
/// let first = RequestId::new();
/// let second = RequestId::new();
/// assert_ne!(first, second);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new time-ordered identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Input of one call: `body`, `query`, `params` and an optional abort signal.
///
/// Every field is optional; an endpoint that declares no input is called
/// with `CallInput::new()`.
///
/// # Example
///
/// ```
/// use accord_core::{AbortController, CallInput};
/// use chrono::NaiveDate;
/// use serde_json::json;
///
/// let controller = AbortController::new();
/// let input = CallInput::new()
///     .param("eventId", 42)
///     .query_param("from", NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
///     .signal(controller.signal());
///
/// assert_eq!(input.params_value(), Some(&json!({"eventId": "42"})));
/// assert_eq!(input.query_value(), Some(&json!({"from": "2024-05-01"})));
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct CallInput {
    body: Option<Value>,
    query: Option<Value>,
    params: Option<Value>,
    signal: Option<AbortSignal>,
    encode_error: Option<String>,
}

impl CallInput {
    /// An empty input.
    pub fn new() -> Self {
        Self::default()
    }

    fn encode(&mut self, value: impl Serialize) -> Option<Value> {
        match serde_json::to_value(value) {
            Ok(value) => Some(value),
            Err(e) => {
                self.encode_error.get_or_insert_with(|| e.to_string());
                None
            }
        }
    }

    /// Sets the JSON body.
    pub fn body(mut self, body: impl Serialize) -> Self {
        self.body = self.encode(body);
        self
    }

    /// Sets the query parameters from a serializable map or struct.
    pub fn query(mut self, query: impl Serialize) -> Self {
        self.query = self.encode(query);
        self
    }

    /// Sets the path parameters from a serializable map or struct.
    pub fn params(mut self, params: impl Serialize) -> Self {
        self.params = self.encode(params);
        self
    }

    /// Adds one query parameter, formatted with its [`ToUrlParameter`] hook.
    pub fn query_param(mut self, name: impl Into<String>, value: impl ToUrlParameter) -> Self {
        insert_param(&mut self.query, name.into(), value.to_url_parameter());
        self
    }

    /// Adds one path parameter, formatted with its [`ToUrlParameter`] hook.
    pub fn param(mut self, name: impl Into<String>, value: impl ToUrlParameter) -> Self {
        insert_param(&mut self.params, name.into(), value.to_url_parameter());
        self
    }

    /// Attaches an abort signal.
    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Returns the body.
    #[must_use]
    pub fn body_value(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Returns the query parameters.
    #[must_use]
    pub fn query_value(&self) -> Option<&Value> {
        self.query.as_ref()
    }

    /// Returns the path parameters.
    #[must_use]
    pub fn params_value(&self) -> Option<&Value> {
        self.params.as_ref()
    }
}

fn insert_param(target: &mut Option<Value>, name: String, text: String) {
    if !matches!(target, Some(Value::Object(_))) {
        *target = Some(Value::Object(Map::new()));
    }
    if let Some(Value::Object(map)) = target {
        map.insert(name, Value::String(text));
    }
}

/// The per-call bundle threaded through the API-level middleware chain.
///
/// The endpoint name and schema are fixed at construction. The input fields
/// are replaceable; extensions carry typed state between stages.
pub struct RequestContext {
    endpoint_name: Arc<str>,
    schema: Arc<EndpointSchema>,
    body: Option<Value>,
    query: Option<Value>,
    params: Option<Value>,
    signal: AbortSignal,
    request_id: RequestId,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl RequestContext {
    /// Builds the context for one call of `endpoint_name`.
    ///
    /// # Errors
    ///
    /// Returns [`AccordError::Encode`] if a field of `input` failed to
    /// serialize.
    pub fn new(
        endpoint_name: impl Into<Arc<str>>,
        schema: Arc<EndpointSchema>,
        input: CallInput,
    ) -> AccordResult<Self> {
        let endpoint_name = endpoint_name.into();
        if let Some(message) = input.encode_error {
            return Err(AccordError::Encode {
                endpoint: endpoint_name.to_string(),
                message,
            });
        }

        Ok(Self {
            endpoint_name,
            schema,
            body: input.body,
            query: input.query,
            params: input.params,
            signal: input.signal.unwrap_or_default(),
            request_id: RequestId::new(),
            started_at: Instant::now(),
            extensions: HashMap::new(),
        })
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn endpoint_name(&self) -> &str {
        &self.endpoint_name
    }

    /// Returns a shared handle to the endpoint name.
    #[must_use]
    pub fn endpoint_tag(&self) -> Arc<str> {
        Arc::clone(&self.endpoint_name)
    }

    /// Returns the endpoint schema.
    #[must_use]
    pub fn schema(&self) -> &Arc<EndpointSchema> {
        &self.schema
    }

    /// Returns the body.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: Option<Value>) {
        self.body = body;
    }

    /// Returns the query parameters.
    #[must_use]
    pub fn query(&self) -> Option<&Value> {
        self.query.as_ref()
    }

    /// Replaces the query parameters.
    pub fn set_query(&mut self, query: Option<Value>) {
        self.query = query;
    }

    /// Returns the path parameters.
    #[must_use]
    pub fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }

    /// Replaces the path parameters.
    pub fn set_params(&mut self, params: Option<Value>) {
        self.params = params;
    }

    /// Returns the abort signal (a never-firing one if the caller gave none).
    #[must_use]
    pub fn signal(&self) -> &AbortSignal {
        &self.signal
    }

    /// Returns `true` if the call has been aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.signal.is_aborted()
    }

    /// Returns the request id.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Overrides the request id.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns when the context was created.
    #[must_use]
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the time elapsed since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns the input fields as one JSON object, for diagnostics.
    #[must_use]
    pub fn input_snapshot(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in [("body", &self.body), ("query", &self.query), ("params", &self.params)] {
            if let Some(value) = value {
                map.insert(key.to_string(), value.clone());
            }
        }
        Value::Object(map)
    }

    /// Stores a typed extension, replacing any previous value of that type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns the extension of type `T`.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns the extension of type `T`.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("endpoint_name", &self.endpoint_name)
            .field("http", self.schema.http())
            .field("body", &self.body)
            .field("query", &self.query)
            .field("params", &self.params)
            .field("signal", &self.signal)
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

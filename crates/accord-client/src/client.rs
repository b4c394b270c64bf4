//! The client factory.
//!
//! [`ApiClient`] wires an [`EndpointMap`] to one API-level chain and hands
//! out one [`EndpointFn`] per endpoint. It performs no validation itself;
//! that is the job of the stages it is built with.

use crate::endpoint::{ApiChain, EndpointFn, TypedEndpoint};
use crate::error::ClientError;
use accord_core::{
    AccordError, AccordResult, AsyncOutcome, CallInput, EndpointMap, EndpointSchema,
    RequestContext, Response,
};
use accord_middleware::{BoxedHandler, BoxedMiddleware, Chain, Handler, Middleware};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

/// A contract-checked API client.
///
/// # Example
///
/// ```
/// use accord_client::ApiClient;
/// use accord_core::{AccordError, CallInput, EndpointSchema, RequestContext, Response, Shape, StatusCode};
/// use accord_middleware::stages::ValidationMiddleware;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let client = ApiClient::builder()
///     .endpoint(
///         "ping",
///         EndpointSchema::get("/ping")
///             .returns(StatusCode::Ok, Shape::string())
///             .build()
///             .unwrap(),
///     )
///     .middleware(ValidationMiddleware::new())
///     .transport(|_ctx: RequestContext| async {
///         Ok::<_, AccordError>(Response::with_data(StatusCode::Ok, json!("pong")))
///     })
///     .build()
///     .unwrap();
///
/// let response = client.call("ping", CallInput::new()).await.unwrap();
/// assert_eq!(response.data, Some(json!("pong")));
/// # });
/// ```
#[derive(Clone)]
pub struct ApiClient {
    endpoints: EndpointMap,
    chain: Arc<ApiChain>,
}

impl ApiClient {
    /// Creates a client builder.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Returns one callable per endpoint, in registration order.
    #[must_use]
    pub fn endpoints(&self) -> IndexMap<String, EndpointFn> {
        self.endpoints
            .iter()
            .map(|(name, schema)| (name.to_string(), self.make(name, schema)))
            .collect()
    }

    /// Returns the callable for `name`.
    #[must_use]
    pub fn endpoint(&self, name: &str) -> Option<EndpointFn> {
        self.endpoints
            .get(name)
            .map(|schema| self.make(name, schema))
    }

    /// Returns the registered endpoint names in order.
    pub fn endpoint_names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.names()
    }

    /// Returns the names of the API-level stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.chain.stage_names()
    }

    /// Calls the endpoint registered under `name`.
    ///
    /// Fails with [`AccordError::UnknownEndpoint`] if there is none.
    pub fn call(&self, name: &str, input: CallInput) -> AsyncOutcome<'static, Response, AccordError> {
        match self.endpoint(name) {
            Some(endpoint) => endpoint.call(input),
            None => AsyncOutcome::ready(Err(AccordError::UnknownEndpoint {
                name: name.to_string(),
            })),
        }
    }

    /// Returns the endpoint `name` with response data decoded into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`AccordError::UnknownEndpoint`] if there is no such endpoint.
    pub fn typed<T: DeserializeOwned>(&self, name: &str) -> AccordResult<TypedEndpoint<T>> {
        self.endpoint(name)
            .map(|endpoint| endpoint.typed())
            .ok_or_else(|| AccordError::UnknownEndpoint {
                name: name.to_string(),
            })
    }

    fn make(&self, name: &str, schema: &Arc<EndpointSchema>) -> EndpointFn {
        EndpointFn::new(Arc::from(name), Arc::clone(schema), Arc::clone(&self.chain))
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoints", &self.endpoints.names().collect::<Vec<_>>())
            .field("chain", &self.chain)
            .finish()
    }
}

/// Builder for [`ApiClient`].
#[derive(Default)]
#[must_use = "builders do nothing unless built"]
pub struct ApiClientBuilder {
    endpoints: EndpointMap,
    stages: Vec<BoxedMiddleware<RequestContext, Response>>,
    transport: Option<BoxedHandler<RequestContext, Response>>,
}

impl ApiClientBuilder {
    /// Replaces the endpoint map.
    pub fn endpoints(mut self, endpoints: EndpointMap) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Registers one endpoint.
    pub fn endpoint(mut self, name: impl Into<String>, schema: EndpointSchema) -> Self {
        self.endpoints.insert(name, schema);
        self
    }

    /// Appends an API-level stage. Stages run in the order added.
    pub fn middleware<M: Middleware<RequestContext, Response>>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Appends an already shared API-level stage.
    pub fn shared_middleware(mut self, middleware: BoxedMiddleware<RequestContext, Response>) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Sets the terminal handler, normally an `HttpTransport`.
    ///
    /// Without one, calls that get past every stage fail with
    /// [`AccordError::IncompleteChain`].
    pub fn transport<H: Handler<RequestContext, Response>>(mut self, transport: H) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets an already shared terminal handler.
    pub fn shared_transport(mut self, transport: BoxedHandler<RequestContext, Response>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoMiddleware`] if no stage was added.
    pub fn build(self) -> Result<ApiClient, ClientError> {
        if self.stages.is_empty() {
            return Err(ClientError::NoMiddleware);
        }

        let mut chain = Chain::builder().stages(self.stages);
        if let Some(transport) = self.transport {
            chain = chain.shared_terminal(transport);
        }
        let chain = chain.build();

        tracing::debug!(
            endpoints = self.endpoints.len(),
            stages = ?chain.stage_names(),
            terminal = chain.has_terminal(),
            "api client ready"
        );

        Ok(ApiClient {
            endpoints: self.endpoints,
            chain: Arc::new(chain),
        })
    }
}

impl fmt::Debug for ApiClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClientBuilder")
            .field("endpoints", &self.endpoints.len())
            .field("stages", &self.stages.len())
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

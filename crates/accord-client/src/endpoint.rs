//! Per-endpoint callables.

use accord_core::{
    AccordError, AccordResult, AsyncOutcome, CallInput, EndpointSchema, RequestContext, Response,
    TypedResponse, ValidationIssue, ValidationIssues,
};
use accord_middleware::Chain;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

pub(crate) type ApiChain = Chain<RequestContext, Response>;

/// The callable for one endpoint.
///
/// Cheap to clone. Every call builds a fresh [`RequestContext`] and runs it
/// through the client's chain; concurrent calls share nothing else.
#[derive(Clone)]
pub struct EndpointFn {
    name: Arc<str>,
    schema: Arc<EndpointSchema>,
    chain: Arc<ApiChain>,
}

impl EndpointFn {
    pub(crate) fn new(name: Arc<str>, schema: Arc<EndpointSchema>, chain: Arc<ApiChain>) -> Self {
        Self {
            name,
            schema,
            chain,
        }
    }

    /// Returns the endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the endpoint schema.
    #[must_use]
    pub fn schema(&self) -> &EndpointSchema {
        &self.schema
    }

    /// Calls the endpoint.
    ///
    /// Pass `CallInput::new()` for endpoints that take no input.
    pub fn call(&self, input: CallInput) -> AsyncOutcome<'static, Response, AccordError> {
        let chain = Arc::clone(&self.chain);
        let context = RequestContext::new(Arc::clone(&self.name), Arc::clone(&self.schema), input);
        AsyncOutcome::new(async move { chain.run(context?).await })
    }

    /// Returns a view of this endpoint that decodes response data into `T`.
    #[must_use]
    pub fn typed<T: DeserializeOwned>(&self) -> TypedEndpoint<T> {
        TypedEndpoint {
            inner: self.clone(),
            _data: PhantomData,
        }
    }
}

impl fmt::Debug for EndpointFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointFn")
            .field("name", &self.name)
            .field("http", self.schema.http())
            .finish_non_exhaustive()
    }
}

/// An endpoint whose response data is decoded into `T`.
///
/// Decoding happens after validation. Data that passed validation but does
/// not fit `T` fails with [`AccordError::InvalidResponse`].
pub struct TypedEndpoint<T> {
    inner: EndpointFn,
    _data: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedEndpoint<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _data: PhantomData,
        }
    }
}

impl<T: DeserializeOwned + Send + 'static> TypedEndpoint<T> {
    /// Returns the endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Calls the endpoint and decodes the response data.
    pub fn call(&self, input: CallInput) -> AsyncOutcome<'static, TypedResponse<T>, AccordError> {
        let endpoint = self.inner.name.clone();
        self.inner
            .call(input)
            .and_then(move |response| async move { decode(&endpoint, response) })
    }
}

impl<T> fmt::Debug for TypedEndpoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedEndpoint")
            .field("name", &self.inner.name)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> AccordResult<TypedResponse<T>> {
    let status = response.status;
    let body = response.data.clone();
    response.into_typed().map_err(|e| {
        let mut issue = ValidationIssue::new("$", e.to_string()).expected(std::any::type_name::<T>());
        if let Some(received) = body.clone() {
            issue = issue.received(received);
        }
        AccordError::InvalidResponse {
            endpoint: endpoint.to_string(),
            status,
            body,
            issues: ValidationIssues::single(issue),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use accord_core::{ErrorKind, Shape, StatusCode};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct User {
        id: String,
    }

    fn endpoint(data: serde_json::Value) -> EndpointFn {
        let schema = EndpointSchema::get("/me")
            .returns(StatusCode::Ok, Shape::any())
            .build()
            .unwrap();
        let chain = Chain::builder()
            .terminal(move |_ctx: RequestContext| {
                let data = data.clone();
                async move { Ok::<_, AccordError>(Response::with_data(StatusCode::Ok, data)) }
            })
            .build();
        EndpointFn::new(Arc::from("me"), Arc::new(schema), Arc::new(chain))
    }

    #[tokio::test]
    async fn test_typed_call_decodes() {
        let typed = endpoint(json!({"id": "u1"})).typed::<User>();
        let response = typed.call(CallInput::new()).await.unwrap();
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(response.data, Some(User { id: "u1".to_string() }));
    }

    #[tokio::test]
    async fn test_typed_call_reports_mismatch_as_invalid_response() {
        let typed = endpoint(json!({"id": 7})).typed::<User>();
        let err = typed.call(CallInput::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
        assert!(err.to_string().contains(r#"{"id":7}"#));
    }

    #[tokio::test]
    async fn test_chain_without_terminal_fails_at_call_time() {
        let schema = EndpointSchema::get("/me")
            .returns(StatusCode::Ok, Shape::any())
            .build()
            .unwrap();
        let endpoint = EndpointFn::new(
            Arc::from("me"),
            Arc::new(schema),
            Arc::new(Chain::builder().build()),
        );
        let err = endpoint.call(CallInput::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncompleteChain);
    }
}

//! Request and response validation.
//!
//! [`ValidationMiddleware`] wraps the rest of the API-level chain:
//!
//! 1. Validate the declared input fields (`body`, `query`, `params`). Any
//!    issue fails the call with [`AccordError::InvalidRequest`] and the rest
//!    of the chain never runs, so no network call is made.
//! 2. Replace the context's fields with the validated values and call `next`.
//! 3. Resolve the response status against the schema's outputs:
//!    - undeclared status: [`AccordError::UnexpectedResponse`]
//!    - body validator fails: [`AccordError::InvalidResponse`] with the raw body
//!    - no-body output: the response must carry no data
//! 4. Evaluate the schema's [`Constraint`](accord_core::Constraint), if any.
//!    A failing constraint is reported as [`AccordError::InvalidResponse`].
//!
//! # Pipeline Position
//!
//! Validation normally sits directly in front of the transport so every
//! other stage sees validated input:
//!
//! ```text
//! RequestContext → Telemetry → [Validation] → HttpTransport
//! ```

use crate::middleware::{Middleware, Next};
use accord_core::{
    AccordError, AccordResult, BoxFuture, EndpointSchema, FieldSpec, OutputSpec, RequestContext,
    RequestId, Response, ValidatedInput, ValidationIssue, ValidationIssues, Verdict,
};
use accord_telemetry::{fields, Logger};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Validates call input before, and the response after, the rest of the chain.
///
/// With a [`Logger`], every verdict this stage reaches is also recorded there
/// at error level. Failures raised further down the chain pass through
/// unlogged; the transport reports its own.
#[derive(Debug, Clone, Default)]
pub struct ValidationMiddleware {
    logger: Option<Logger>,
}

impl ValidationMiddleware {
    /// Creates the validation stage.
    #[must_use]
    pub const fn new() -> Self {
        Self { logger: None }
    }

    /// Creates the validation stage reporting contract violations to `logger`.
    #[must_use]
    pub fn with_logger(logger: Logger) -> Self {
        Self {
            logger: Some(logger),
        }
    }

    fn report(&self, err: &AccordError, endpoint: &str, request_id: RequestId, input: Value) {
        let Some(logger) = &self.logger else {
            return;
        };

        let message = err.to_string();
        let mut metadata = Map::new();
        metadata.insert(fields::ERROR_KIND.to_string(), Value::from(err.kind().as_str()));
        metadata.insert(fields::ERROR.to_string(), Value::from(message.clone()));
        metadata.insert(fields::MESSAGE.to_string(), Value::from(message.clone()));
        metadata.insert(fields::INPUT.to_string(), input);
        metadata.insert(fields::ENDPOINT.to_string(), Value::from(endpoint));
        metadata.insert(
            fields::REQUEST_ID.to_string(),
            Value::from(request_id.to_string()),
        );
        if let Some(verdict) = err.verdict() {
            metadata.insert(fields::VERDICT.to_string(), Value::from(verdict.as_str()));
        }
        if let Some(status) = err.status() {
            metadata.insert(fields::HTTP_STATUS.to_string(), Value::from(status));
        }
        logger.error(message, Value::Object(metadata));
    }
}

impl Middleware<RequestContext, Response> for ValidationMiddleware {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn process<'a>(
        &'a self,
        mut ctx: RequestContext,
        next: Next<'a, RequestContext, Response>,
    ) -> BoxFuture<'a, AccordResult<Response>> {
        Box::pin(async move {
            let schema = Arc::clone(ctx.schema());
            let endpoint = ctx.endpoint_name().to_string();
            let request_id = ctx.request_id();

            let input = match validate_input(&mut ctx, &schema).await {
                Ok(input) => input,
                Err(issues) => {
                    tracing::debug!(
                        endpoint = %endpoint,
                        verdict = Verdict::InvalidRequest.as_str(),
                        issues = issues.len(),
                        "request rejected before transport"
                    );
                    let err = AccordError::InvalidRequest {
                        endpoint: endpoint.clone(),
                        issues,
                    };
                    self.report(&err, &endpoint, request_id, ctx.input_snapshot());
                    return Err(err);
                }
            };

            let snapshot = self.logger.as_ref().map(|_| ctx.input_snapshot());
            let response = next.run(ctx).await?;
            let checked = check_response(&endpoint, &schema, &input, response).await;
            if let (Err(err), Some(snapshot)) = (&checked, snapshot) {
                self.report(err, &endpoint, request_id, snapshot);
            }
            checked
        })
    }
}

async fn check_response(
    endpoint: &str,
    schema: &EndpointSchema,
    input: &ValidatedInput,
    response: Response,
) -> AccordResult<Response> {
    let response = validate_output(endpoint, schema, response).await?;

    if let Some(constraint) = schema.constraint() {
        if !constraint.holds(input, &response) {
            let issue = ValidationIssue::new(
                "$",
                format!("constraint `{}` does not hold", constraint.name()),
            );
            return Err(reject_response(endpoint, response, issue.into()));
        }
    }

    tracing::debug!(
        endpoint = %endpoint,
        verdict = Verdict::Passed.as_str(),
        status = response.status.as_u16(),
        "response validated"
    );
    Ok(response)
}

async fn validate_input(
    ctx: &mut RequestContext,
    schema: &EndpointSchema,
) -> Result<ValidatedInput, ValidationIssues> {
    let spec = schema.input();
    let mut issues = Vec::new();
    let mut keep = |result: Result<Option<Value>, ValidationIssues>| match result {
        Ok(value) => value,
        Err(found) => {
            issues.extend(found.into_vec());
            None
        }
    };

    let body = keep(validate_field("body", spec.body.as_ref(), ctx.body().cloned()).await);
    let query = keep(validate_field("query", spec.query.as_ref(), ctx.query().cloned()).await);
    let params = keep(validate_field("params", spec.params.as_ref(), ctx.params().cloned()).await);

    if let Some(issues) = ValidationIssues::from_vec(issues) {
        return Err(issues);
    }

    ctx.set_body(body.clone());
    ctx.set_query(query.clone());
    ctx.set_params(params.clone());
    Ok(ValidatedInput {
        body,
        query,
        params,
    })
}

/// Validates one input field. Undeclared fields pass through unchecked.
async fn validate_field(
    field: &str,
    spec: Option<&FieldSpec>,
    raw: Option<Value>,
) -> Result<Option<Value>, ValidationIssues> {
    let Some(spec) = spec else {
        return Ok(raw);
    };

    match raw {
        None | Some(Value::Null) if spec.is_optional() => Ok(None),
        None | Some(Value::Null) => Err(ValidationIssue::new(field, "required value is missing")
            .expected(spec.validator().describe())
            .into()),
        Some(value) => spec
            .validator()
            .parse(value)
            .await
            .map(Some)
            .map_err(|issues| issues.scoped(field)),
    }
}

async fn validate_output(
    endpoint: &str,
    schema: &EndpointSchema,
    response: Response,
) -> AccordResult<Response> {
    let Some(spec) = schema.output_for(response.status) else {
        tracing::debug!(
            endpoint = %endpoint,
            verdict = Verdict::UnexpectedResponse.as_str(),
            status = response.status.as_u16(),
            "undeclared response status"
        );
        return Err(AccordError::UnexpectedResponse {
            endpoint: endpoint.to_string(),
            status: response.status.as_u16(),
            body: response.data,
        });
    };

    match (spec, &response.data) {
        (OutputSpec::NoBody, None) => Ok(response),
        (OutputSpec::NoBody, Some(body)) => {
            let issue = ValidationIssue::new("$", "expected no body")
                .expected("no body")
                .received(body.clone());
            Err(reject_response(endpoint, response, issue.into()))
        }
        (OutputSpec::Body(validator), None) => {
            let issue = ValidationIssue::new("$", "response body is missing")
                .expected(validator.describe());
            Err(reject_response(endpoint, response, issue.into()))
        }
        (OutputSpec::Body(validator), Some(raw)) => match validator.parse(raw.clone()).await {
            Ok(data) => Ok(Response::with_data(response.status, data)),
            Err(issues) => Err(reject_response(endpoint, response, issues)),
        },
    }
}

fn reject_response(endpoint: &str, response: Response, issues: ValidationIssues) -> AccordError {
    tracing::debug!(
        endpoint = %endpoint,
        verdict = Verdict::InvalidResponse.as_str(),
        status = response.status.as_u16(),
        "response rejected"
    );
    AccordError::InvalidResponse {
        endpoint: endpoint.to_string(),
        status: response.status,
        body: response.data,
        issues,
    }
}

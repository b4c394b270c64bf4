//! HttpTransport behaviour against a scripted fetch.

use accord_core::wire::{endpoint_of, WireRequest, WireResponse};
use accord_core::{
    AbortController, CallInput, EndpointSchema, ErrorKind, RequestContext, Response, Shape,
    StatusCode,
};
use accord_middleware::stages::{AuthMiddleware, RequestIdMiddleware, REQUEST_ID_HEADER};
use accord_middleware::Handler;
use accord_telemetry::{fields, LogLevel, LogRecord, Logger};
use accord_transport::{HttpTransport, ReqwestFetch};
use bytes::Bytes;
use http::Method;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

type Seen = Arc<Mutex<Vec<WireRequest>>>;

/// A fetch that records every request and answers with `status` and `body`.
fn scripted(
    status: u16,
    body: &'static str,
) -> (
    Seen,
    impl Fn(WireRequest) -> std::future::Ready<anyhow::Result<WireResponse>>,
) {
    let seen: Seen = Arc::default();
    let record = Arc::clone(&seen);
    let fetch = move |request: WireRequest| {
        record.lock().push(request);
        let response = http::Response::builder()
            .status(status)
            .body(Bytes::from_static(body.as_bytes()))
            .map_err(anyhow::Error::from);
        std::future::ready(response)
    };
    (seen, fetch)
}

fn recording_logger() -> (Logger, Arc<Mutex<Vec<LogRecord>>>) {
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&records);
    let logger = Logger::new().with_sink(move |record: &LogRecord| {
        sink.lock().push(record.clone());
    });
    (logger, records)
}

fn create_user() -> Arc<EndpointSchema> {
    Arc::new(
        EndpointSchema::post("/user")
            .body(Shape::object(vec![("handle", Shape::string().required())]))
            .returns(StatusCode::Created, Shape::any())
            .build()
            .unwrap(),
    )
}

fn delete_user() -> Arc<EndpointSchema> {
    Arc::new(
        EndpointSchema::delete("/user/:id")
            .params(Shape::object(vec![("id", Shape::string().required())]))
            .no_content(StatusCode::NoContent)
            .build()
            .unwrap(),
    )
}

fn ctx(name: &str, schema: Arc<EndpointSchema>, input: CallInput) -> RequestContext {
    RequestContext::new(name, schema, input).unwrap()
}

#[tokio::test]
async fn test_post_sends_json_body_and_headers() {
    let (seen, fetch) = scripted(201, r#"{"id":"u1","handle":"ada"}"#);
    let transport = HttpTransport::builder("https://api.test/")
        .fetch(fetch)
        .wire_stage(RequestIdMiddleware::new())
        .wire_stage(AuthMiddleware::new(|| async { Some("t0k3n".to_string()) }))
        .default_header("x-client", "accord-tests")
        .build()
        .unwrap();

    let call = ctx(
        "createUser",
        create_user(),
        CallInput::new().body(json!({"handle": "ada"})),
    );
    let request_id = call.request_id();
    let response = transport.call(call).await.unwrap();

    assert_eq!(
        response,
        Response::with_data(StatusCode::Created, json!({"id": "u1", "handle": "ada"}))
    );

    let seen = seen.lock();
    let request = &seen[0];
    assert_eq!(request.method(), Method::POST);
    assert_eq!(request.uri(), "https://api.test/user");
    assert_eq!(request.headers()["content-type"], "application/json");
    assert_eq!(request.headers()["authorization"], "Bearer t0k3n");
    assert_eq!(request.headers()["x-client"], "accord-tests");
    assert_eq!(
        request.headers()[REQUEST_ID_HEADER],
        request_id.to_string().as_str()
    );
    assert_eq!(endpoint_of(request), Some("createUser"));
    let body: serde_json::Value = serde_json::from_slice(request.body()).unwrap();
    assert_eq!(body, json!({"handle": "ada"}));
}

#[tokio::test]
async fn test_get_never_carries_a_body() {
    let (seen, fetch) = scripted(200, "[]");
    let schema = Arc::new(
        EndpointSchema::get("/feed")
            .optional_query(Shape::any())
            .returns(StatusCode::Ok, Shape::array(Shape::any()))
            .build()
            .unwrap(),
    );
    let transport = HttpTransport::builder("https://api.test")
        .fetch(fetch)
        .build()
        .unwrap();

    transport
        .call(ctx(
            "feed",
            schema,
            CallInput::new()
                .body(json!({"ignored": true}))
                .query(json!({"limit": 5})),
        ))
        .await
        .unwrap();

    let seen = seen.lock();
    assert!(seen[0].body().is_empty());
    assert_eq!(seen[0].uri(), "https://api.test/feed?limit=5");
    assert_eq!(seen[0].headers()["content-type"], "application/json");
}

#[tokio::test]
async fn test_empty_no_content_resolves_without_data() {
    let (seen, fetch) = scripted(204, "");
    let transport = HttpTransport::builder("https://api.test")
        .fetch(fetch)
        .build()
        .unwrap();

    let response = transport
        .call(ctx(
            "deleteUser",
            delete_user(),
            CallInput::new().param("id", "u 1"),
        ))
        .await
        .unwrap();

    assert_eq!(response, Response::empty(StatusCode::NoContent));
    assert_eq!(seen.lock()[0].uri(), "https://api.test/user/u%201");
}

#[tokio::test]
async fn test_no_content_with_json_body_is_logged_and_rejected() {
    let (_seen, fetch) = scripted(204, r#"{"deleted":true}"#);
    let (logger, records) = recording_logger();
    let transport = HttpTransport::builder("https://api.test")
        .fetch(fetch)
        .logger(logger)
        .build()
        .unwrap();

    let err = transport
        .call(ctx("deleteUser", delete_user(), CallInput::new().param("id", "u1")))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NoContentWithBody);
    let records = records.lock();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, LogLevel::Error);
    assert_eq!(
        records[0].field(fields::ERROR_KIND),
        Some(&json!("no_content_with_body"))
    );
    assert_eq!(records[0].field(fields::ENDPOINT), Some(&json!("deleteUser")));
    assert_eq!(
        records[0].field(fields::INPUT),
        Some(&json!({"params": {"id": "u1"}}))
    );
}

#[tokio::test]
async fn test_non_json_body_carries_raw_text() {
    let (_seen, fetch) = scripted(503, "upstream unavailable");
    let (logger, records) = recording_logger();
    let transport = HttpTransport::builder("https://api.test")
        .fetch(fetch)
        .logger(logger)
        .build()
        .unwrap();

    let err = transport
        .call(ctx(
            "createUser",
            create_user(),
            CallInput::new().body(json!({"handle": "ada"})),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NonJsonBody);
    assert_eq!(err.status(), Some(503));
    assert!(err.to_string().contains("upstream unavailable"));
    assert_eq!(records.lock()[0].field(fields::HTTP_STATUS), Some(&json!(503)));
}

#[tokio::test]
async fn test_missing_parameter_fails_before_fetch() {
    let (seen, fetch) = scripted(204, "");
    let transport = HttpTransport::builder("https://api.test")
        .fetch(fetch)
        .build()
        .unwrap();

    let err = transport
        .call(ctx("deleteUser", delete_user(), CallInput::new()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingParameter);
    assert!(seen.lock().is_empty());
}

#[tokio::test]
async fn test_network_failure_becomes_transport_error() {
    let (logger, records) = recording_logger();
    let transport = HttpTransport::builder("https://api.test")
        .fetch(|_request: WireRequest| async {
            Err::<WireResponse, _>(anyhow::anyhow!("connection refused"))
        })
        .logger(logger)
        .build()
        .unwrap();

    let err = transport
        .call(ctx(
            "createUser",
            create_user(),
            CallInput::new().body(json!({"handle": "ada"})),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(records.lock().len(), 1);
}

#[tokio::test]
async fn test_already_aborted_call_never_fetches() {
    let (seen, fetch) = scripted(201, "{}");
    let (logger, records) = recording_logger();
    let transport = HttpTransport::builder("https://api.test")
        .fetch(fetch)
        .logger(logger)
        .build()
        .unwrap();
    let controller = AbortController::new();
    controller.abort();

    let err = transport
        .call(ctx(
            "createUser",
            create_user(),
            CallInput::new()
                .body(json!({"handle": "ada"}))
                .signal(controller.signal()),
        ))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(seen.lock().is_empty());
    assert!(records.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_abort_during_fetch_cancels_without_logging() {
    let (logger, records) = recording_logger();
    let transport = HttpTransport::builder("https://api.test")
        .fetch(|_request: WireRequest| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, anyhow::Error>(http::Response::new(Bytes::from_static(b"{}")))
        })
        .logger(logger)
        .build()
        .unwrap();
    let controller = AbortController::new();
    let signal = controller.signal();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.abort();
    });

    let err = transport
        .call(ctx(
            "createUser",
            create_user(),
            CallInput::new()
                .body(json!({"handle": "ada"}))
                .signal(signal),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(records.lock().is_empty());
}

#[test]
fn test_builder_rejects_relative_base_url() {
    let err = HttpTransport::builder("/api")
        .fetch(ReqwestFetch::new())
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("/api"));
}

#[test]
fn test_wire_stage_order_is_preserved() {
    let transport = HttpTransport::builder("https://api.test")
        .fetch(ReqwestFetch::new())
        .wire_stage(RequestIdMiddleware::new())
        .wire_stage(AuthMiddleware::new(|| async { None::<String> }))
        .build()
        .unwrap();
    assert_eq!(transport.wire_stage_names(), vec!["request_id", "auth"]);
}

//! Router-level tests driven through `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use mock_gcm_core::{Engine, MulticastResponse, Uses};
use mock_gcm_web::{MAX_PAYLOAD_SIZE, create_router};
use tower::ServiceExt;

fn setup() -> (Arc<Engine>, Router) {
    let engine = Arc::new(Engine::new("secrets"));
    let router = create_router(Arc::clone(&engine));
    (engine, router)
}

fn send(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/gcm/send")
        .header(header::AUTHORIZATION, "key=secrets")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn test_mixed_outcomes_in_one_multicast() {
    let (engine, router) = setup();
    engine.set_error_override("4", "InvalidRegistration", Uses::Unlimited);
    engine.set_canonical_remap("15", "16");

    let response = router
        .oneshot(send(
            r#"{"data":{"score":"5x1"},"registration_ids":["4","8","15"]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed: MulticastResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(parsed.success, 2);
    assert_eq!(parsed.failure, 1);
    assert_eq!(parsed.canonical_ids, 1);
    assert_eq!(parsed.results[0].error.as_deref(), Some("InvalidRegistration"));
    assert!(parsed.results[1].message_id.is_some());
    assert_eq!(parsed.results[2].registration_id.as_deref(), Some("16"));

    let received = engine.received_messages();
    let ids: Vec<_> = received.iter().map(|m| m.registration_id.as_str()).collect();
    assert_eq!(ids, ["8", "15"]);
}

#[tokio::test]
async fn test_failure_result_omits_success_keys_on_the_wire() {
    let (engine, router) = setup();
    engine.set_error_override("4", "NotRegistered", Uses::Times(1));

    let response = router
        .oneshot(send(r#"{"data":{},"registration_ids":["4"]}"#))
        .await
        .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["results"][0], serde_json::json!({"error": "NotRegistered"}));
}

#[tokio::test]
async fn test_wrong_key_is_unauthorized() {
    let (engine, router) = setup();

    let request = Request::builder()
        .method(Method::POST)
        .header(header::AUTHORIZATION, "key=nope")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"data":{},"registration_ids":["1"]}"#))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(engine.received_messages().is_empty());
}

#[tokio::test]
async fn test_content_type_with_charset_is_rejected() {
    let (_engine, router) = setup();

    let request = Request::builder()
        .method(Method::POST)
        .header(header::AUTHORIZATION, "key=secrets")
        .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
        .body(Body::from(r#"{"data":{},"registration_ids":["1"]}"#))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (engine, router) = setup();

    let response = router.oneshot(send("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(engine.received_messages().is_empty());
}

#[tokio::test]
async fn test_oversized_body_is_bad_request() {
    let (_engine, router) = setup();

    let response = router
        .oneshot(send(vec![b' '; MAX_PAYLOAD_SIZE + 1]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_injected_failure_carries_retry_after_once() {
    let (engine, router) = setup();
    engine.set_next_request_failure(503, Some("120")).unwrap();

    let first = router
        .clone()
        .oneshot(send(r#"{"data":{},"registration_ids":["1"]}"#))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(first.headers()[header::RETRY_AFTER], "120");
    assert!(body_bytes(first).await.is_empty());

    let second = router
        .oneshot(send(r#"{"data":{},"registration_ids":["1"]}"#))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert!(second.headers().get(header::RETRY_AFTER).is_none());
}

#[tokio::test]
async fn test_injected_failure_preempts_missing_authorization() {
    let (engine, router) = setup();
    engine.set_next_request_failure(500, None).unwrap();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/anything")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(header::RETRY_AFTER).is_none());
}

#[tokio::test]
async fn test_every_method_and_path_is_a_send() {
    let (engine, router) = setup();

    for (method, uri) in [
        (Method::PUT, "/"),
        (Method::GET, "/gcm/send"),
        (Method::DELETE, "/deep/nested/path?x=1"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "key=secrets")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"data":{},"registration_ids":["7"]}"#))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }

    assert_eq!(engine.received_messages().len(), 3);
}

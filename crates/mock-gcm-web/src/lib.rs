//! Mock GCM web server
//!
//! Serves the mock gateway engine over HTTP. Every method and path is
//! treated as a multicast send; the router only adds request logging and
//! tracing around the engine.

#![forbid(unsafe_code)]
#![cfg_attr(not(test), forbid(clippy::unwrap_used))]
#![cfg_attr(not(test), forbid(clippy::panic))]
#![cfg_attr(test, deny(clippy::unwrap_used, clippy::panic))]
#![deny(clippy::expect_used)]

use std::sync::Arc;

use axum::Router;
use mock_gcm_core::Engine;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod adapter;
mod error;
pub mod middleware;
pub mod preset;
mod server;

pub use adapter::{AxumRequest, MAX_PAYLOAD_SIZE, gateway, into_http_response};
pub use error::{Error, Result};
pub use preset::{CanonicalPreset, ErrorPreset, FailurePreset, Preset, StatusValue};
pub use server::MockGcmServer;

/// Web server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind to (e.g., "127.0.0.1:8282"); port 0 picks a free one.
    pub bind_address: String,
    /// Secret expected in `Authorization: key=<secret>`.
    pub api_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8282".to_string(),
            api_key: "secrets".to_string(),
        }
    }
}

/// Create the gateway router around a shared engine.
pub fn create_router(engine: Arc<Engine>) -> Router {
    info!("Creating mock gateway router");

    Router::new()
        .fallback(adapter::gateway)
        .with_state(engine)
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use axum::{
        body::Body,
        http::{Method, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn build_test_request(
        uri: &str,
        method: Method,
        headers: Vec<(&str, &str)>,
        body: &str,
    ) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn valid_send(uri: &str) -> axum::http::Request<Body> {
        build_test_request(
            uri,
            Method::POST,
            vec![
                ("Authorization", "key=secrets"),
                ("Content-Type", "application/json"),
            ],
            r#"{"data":{"score":"5x1"},"registration_ids":["4","8"]}"#,
        )
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address, "127.0.0.1:8282");
        assert_eq!(config.api_key, "secrets");
    }

    #[tokio::test]
    async fn test_send_returns_multicast_json() {
        let engine = Arc::new(Engine::new("secrets"));
        let router = create_router(Arc::clone(&engine));

        let response = router.oneshot(valid_send("/gcm/send")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/json");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], 2);
        assert_eq!(json["failure"], 0);
        assert_eq!(engine.received_messages().len(), 2);
    }

    #[tokio::test]
    async fn test_any_path_reaches_the_engine() {
        let engine = Arc::new(Engine::new("secrets"));
        let router = create_router(engine);

        let response = router.oneshot(valid_send("/nonexistent")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_authorization_is_unauthorized() {
        let router = create_router(Arc::new(Engine::new("secrets")));

        let request = build_test_request(
            "/gcm/send",
            Method::POST,
            vec![("Content-Type", "application/json")],
            "{}",
        );
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}

//! Bridges axum requests and responses to the engine's narrow interface.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::Response,
};
use mock_gcm_core::{Engine, EngineResponse, InboundRequest};
use tracing::warn;

/// Maximum request payload size (1MB).
pub const MAX_PAYLOAD_SIZE: usize = 1_048_576;

/// A fully buffered axum request.
#[derive(Debug)]
pub struct AxumRequest {
    method: Method,
    headers: HeaderMap,
    body: Option<axum::body::Bytes>,
}

impl AxumRequest {
    /// Buffer the body, up to [`MAX_PAYLOAD_SIZE`].
    ///
    /// A body that cannot be read is kept as `None` so the engine still runs
    /// its earlier checks before rejecting it.
    pub async fn read(request: Request) -> Self {
        let (parts, body) = request.into_parts();
        let body = match axum::body::to_bytes(body, MAX_PAYLOAD_SIZE).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "Failed to read request body");
                None
            }
        };
        Self {
            method: parts.method,
            headers: parts.headers,
            body,
        }
    }
}

impl InboundRequest for AxumRequest {
    fn method(&self) -> &str {
        self.method.as_str()
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Convert an engine answer into an HTTP response.
#[must_use]
pub fn into_http_response(response: EngineResponse) -> Response {
    let (status, headers, body) = response.into_parts();

    let mut http_response = Response::new(Body::from(body));
    *http_response.status_mut() =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                http_response.headers_mut().insert(name, value);
            }
            _ => warn!(header = name, "Dropping unrepresentable response header"),
        }
    }

    http_response
}

/// Catch-all handler: every method and path is a send to the gateway.
pub async fn gateway(State(engine): State<Arc<Engine>>, request: Request) -> Response {
    let request = AxumRequest::read(request).await;
    into_http_response(engine.handle(&request))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use axum::http::header;

    #[tokio::test]
    async fn test_read_keeps_headers_and_body() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let request = AxumRequest::read(request).await;

        assert_eq!(request.method(), "POST");
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.header("Authorization"), None);
        assert_eq!(request.body(), Some(&b"{}"[..]));
    }

    #[tokio::test]
    async fn test_oversized_body_is_unreadable() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .body(Body::from(vec![b' '; MAX_PAYLOAD_SIZE + 1]))
            .unwrap();

        let request = AxumRequest::read(request).await;

        assert!(request.body().is_none());
    }

    #[test]
    fn test_into_http_response_copies_status_and_headers() {
        let response = into_http_response(
            EngineResponse::with_status(503).header("Retry-After", "120"),
        );

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "120");
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }
}

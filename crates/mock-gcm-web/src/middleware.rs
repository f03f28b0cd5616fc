//! Request logging middleware.
//!
//! Every exchange with the mock is logged with method, uri, status and
//! duration; rejections are raised to `warn` and injected 5xx failures to
//! `error` so they stand out in test output.

use axum::{
    extract::Request,
    http::{Method, StatusCode, Uri},
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Request context captured before the request is handed on.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub start: Instant,
}

impl RequestContext {
    fn from_request(req: &Request) -> Self {
        Self {
            method: req.method().clone(),
            uri: req.uri().clone(),
            start: Instant::now(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn log_completion(&self, status: StatusCode) {
        let duration_ms = self.elapsed().as_millis();
        if status.is_server_error() {
            error!(
                method = %self.method,
                uri = %self.uri,
                duration_ms,
                status = status.as_u16(),
                "Request failed"
            );
        } else if status.is_client_error() {
            warn!(
                method = %self.method,
                uri = %self.uri,
                duration_ms,
                status = status.as_u16(),
                "Request rejected"
            );
        } else {
            info!(
                method = %self.method,
                uri = %self.uri,
                duration_ms,
                status = status.as_u16(),
                "Request completed"
            );
        }
    }
}

/// Logs every request with its outcome and timing.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let ctx = RequestContext::from_request(&req);
    let response = next.run(req).await;
    ctx.log_completion(response.status());
    response
}

//! The gateway engine: one instance owns all mutable state of one mock.

use tracing::{info, warn};

use crate::error::Result;
use crate::interface::{EngineResponse, InboundRequest};
use crate::ledger::{Ledger, ReceivedMessage};
use crate::outcome::synthesize;
use crate::store::{ConfigStore, NextRequestFailure, Uses};
use crate::validation::RequestValidator;

const INTERNAL_SERVER_ERROR: u16 = 500;

/// Stateful request handler plus the configuration surface tests drive it with.
///
/// `Engine` is `Send + Sync`; share it behind an `Arc` between the HTTP
/// adapter and the controlling test.
#[derive(Debug)]
pub struct Engine {
    validator: RequestValidator,
    store: ConfigStore,
    ledger: Ledger,
}

impl Engine {
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        Self {
            validator: RequestValidator::new(api_key),
            store: ConfigStore::new(),
            ledger: Ledger::new(),
        }
    }

    /// Answer one request. Never fails: every problem becomes a status code.
    pub fn handle<R>(&self, request: &R) -> EngineResponse
    where
        R: InboundRequest + ?Sized,
    {
        let send = match self.validator.validate(&self.store, request) {
            Ok(send) => send,
            Err(rejection) => return rejection.into_response(),
        };

        let response = synthesize(&send, &self.store, &self.ledger);
        match serde_json::to_vec(&response) {
            Ok(body) => EngineResponse::json(body),
            Err(e) => {
                warn!(error = %e, "Failed to encode multicast response");
                EngineResponse::with_status(INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Make `recipient` fail with `error` for the given number of uses.
    pub fn set_error_override(
        &self,
        recipient: impl Into<String>,
        error: impl Into<String>,
        uses: Uses,
    ) {
        let recipient = recipient.into();
        let error = error.into();
        info!(recipient = %recipient, error = %error, ?uses, "Error override set");
        self.store.set_error_override(recipient, error, uses);
    }

    pub fn consume_error_override(&self, recipient: &str) -> Option<String> {
        self.store.consume_error_override(recipient)
    }

    /// Report `canonical_id` for every successful send to `recipient`.
    pub fn set_canonical_remap(&self, recipient: impl Into<String>, canonical_id: impl Into<String>) {
        let recipient = recipient.into();
        let canonical_id = canonical_id.into();
        info!(recipient = %recipient, canonical_id = %canonical_id, "Canonical remap set");
        self.store.set_canonical_remap(recipient, canonical_id);
    }

    #[must_use]
    pub fn lookup_canonical_remap(&self, recipient: &str) -> Option<String> {
        self.store.lookup_canonical_remap(recipient)
    }

    /// Fail the next request with `status`, optionally advertising `Retry-After`.
    ///
    /// # Errors
    ///
    /// Returns an error for statuses outside `200..=599` or a `retry_after`
    /// that is not a legal header value; nothing is stored in that case.
    pub fn set_next_request_failure(&self, status: u16, retry_after: Option<&str>) -> Result<()> {
        let failure = NextRequestFailure::new(status, retry_after.map(str::to_string))?;
        self.arm_next_request_failure(failure);
        Ok(())
    }

    /// Like [`Engine::set_next_request_failure`] with a textual status code.
    ///
    /// # Errors
    ///
    /// Additionally rejects status codes that are not numeric.
    pub fn set_next_request_failure_str(&self, status: &str, retry_after: Option<&str>) -> Result<()> {
        let failure = NextRequestFailure::parse(status, retry_after.map(str::to_string))?;
        self.arm_next_request_failure(failure);
        Ok(())
    }

    /// Store an already validated failure for the next request.
    pub fn arm_next_request_failure(&self, failure: NextRequestFailure) {
        info!(
            status = failure.status(),
            retry_after = ?failure.retry_after(),
            "Next request failure armed"
        );
        self.store.set_next_request_failure(failure);
    }

    pub fn consume_next_request_failure(&self) -> Option<NextRequestFailure> {
        self.store.consume_next_request_failure()
    }

    /// Copy of everything accepted so far, in arrival order.
    #[must_use]
    pub fn received_messages(&self) -> Vec<ReceivedMessage> {
        self.ledger.snapshot()
    }

    /// Forget all configuration and received messages.
    pub fn clear(&self) {
        self.store.clear();
        self.ledger.clear();
        info!("Engine state cleared");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::error::Error;
    use crate::interface::RawRequest;

    fn send(body: &str) -> RawRequest {
        RawRequest::post()
            .with_header("Authorization", "key=secrets")
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    #[test]
    fn test_handle_success_is_json() {
        let engine = Engine::new("secrets");
        let response = engine.handle(&send(r#"{"data": {}, "registration_ids": ["4"]}"#));

        assert_eq!(response.status(), 200);
        assert_eq!(response.header_value("Content-Type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(response.body_bytes()).unwrap();
        assert_eq!(body["success"], 1);
        assert_eq!(engine.received_messages().len(), 1);
    }

    #[test]
    fn test_rejected_request_leaves_ledger_alone() {
        let engine = Engine::new("secrets");
        let response = engine.handle(&send("not json"));

        assert_eq!(response.status(), 400);
        assert!(response.body_bytes().is_empty());
        assert!(engine.received_messages().is_empty());
    }

    #[test]
    fn test_invalid_failure_configuration_stores_nothing() {
        let engine = Engine::new("secrets");

        assert_eq!(
            engine.set_next_request_failure_str("boom", None),
            Err(Error::non_numeric_status_code("boom"))
        );
        assert_eq!(
            engine.set_next_request_failure(1000, None),
            Err(Error::invalid_status_code(1000))
        );
        assert_eq!(engine.consume_next_request_failure(), None);
    }

    #[test]
    fn test_method_does_not_affect_handling() {
        let engine = Engine::new("secrets");

        for method in ["GET", "PUT", "DELETE"] {
            let request = send(r#"{"data": {}, "registration_ids": ["4"]}"#).with_method(method);
            assert_eq!(request.method(), method);
            assert_eq!(engine.handle(&request).status(), 200, "{method}");
        }
        assert_eq!(engine.received_messages().len(), 3);

        let unauthorized = RawRequest::post().with_method("GET");
        assert_eq!(engine.handle(&unauthorized).status(), 401);
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }
}

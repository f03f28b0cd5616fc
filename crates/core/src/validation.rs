//! Request validation pipeline.
//!
//! Checks run in a fixed order and stop at the first failure:
//! - pending injected failure
//! - `Authorization` header
//! - `Content-Type` header
//! - body schema

use tracing::warn;

use crate::interface::{
    APPLICATION_JSON, AUTHORIZATION, CONTENT_TYPE, EngineResponse, InboundRequest, RETRY_AFTER,
};
use crate::request::{SchemaViolation, SendRequest};
use crate::store::{ConfigStore, NextRequestFailure};

const UNAUTHORIZED: u16 = 401;
const BAD_REQUEST: u16 = 400;

/// Why a request was turned away before any recipient was processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The configured one-shot failure fired.
    InjectedFailure(NextRequestFailure),
    /// Credential header missing or wrong.
    Unauthorized,
    /// Declared content type is not exactly `application/json`.
    UnsupportedContentType { content_type: Option<String> },
    /// Body failed the schema.
    InvalidBody(SchemaViolation),
}

impl Rejection {
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::InjectedFailure(failure) => failure.status(),
            Self::Unauthorized => UNAUTHORIZED,
            Self::UnsupportedContentType { .. } | Self::InvalidBody(_) => BAD_REQUEST,
        }
    }

    /// Bodiless response for this rejection.
    #[must_use]
    pub fn into_response(self) -> EngineResponse {
        let response = EngineResponse::with_status(self.status());
        match self {
            Self::InjectedFailure(failure) => match failure.retry_after() {
                Some(retry_after) => response.header(RETRY_AFTER, retry_after),
                None => response,
            },
            _ => response,
        }
    }
}

/// Validator bound to one api key.
#[derive(Debug, Clone)]
pub struct RequestValidator {
    expected_authorization: String,
}

impl RequestValidator {
    #[must_use]
    pub fn new(api_key: &str) -> Self {
        Self {
            expected_authorization: format!("key={api_key}"),
        }
    }

    /// Run the whole pipeline.
    ///
    /// The injected-failure check consumes the pending failure, so it fires
    /// for exactly one request whatever that request contains.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] of the first check that fails.
    pub fn validate<R>(&self, store: &ConfigStore, request: &R) -> Result<SendRequest, Rejection>
    where
        R: InboundRequest + ?Sized,
    {
        if let Some(failure) = store.consume_next_request_failure() {
            warn!(
                method = request.method(),
                status = failure.status(),
                "Injected request failure fired"
            );
            return Err(Rejection::InjectedFailure(failure));
        }

        self.check_authorization(request)
            .and_then(|()| check_content_type(request))
            .and_then(|()| check_body(request))
            .inspect_err(|rejection| {
                warn!(
                    method = request.method(),
                    status = rejection.status(),
                    reason = ?rejection,
                    "Request rejected"
                );
            })
    }

    fn check_authorization<R>(&self, request: &R) -> Result<(), Rejection>
    where
        R: InboundRequest + ?Sized,
    {
        match request.header(AUTHORIZATION) {
            Some(value) if value == self.expected_authorization => Ok(()),
            _ => Err(Rejection::Unauthorized),
        }
    }
}

fn check_content_type<R>(request: &R) -> Result<(), Rejection>
where
    R: InboundRequest + ?Sized,
{
    match request.header(CONTENT_TYPE) {
        Some(APPLICATION_JSON) => Ok(()),
        other => Err(Rejection::UnsupportedContentType {
            content_type: other.map(str::to_string),
        }),
    }
}

fn check_body<R>(request: &R) -> Result<SendRequest, Rejection>
where
    R: InboundRequest + ?Sized,
{
    let body = request
        .body()
        .ok_or(Rejection::InvalidBody(SchemaViolation::Unreadable))?;
    SendRequest::parse(body).map_err(Rejection::InvalidBody)
}

//! The narrow seam between the engine and whatever HTTP stack carries it.
//!
//! The engine reads a request through [`InboundRequest`] and answers with an
//! [`EngineResponse`]; it never sees sockets, framing or a concrete HTTP type.

/// Credential header carrying `key=<api key>`.
pub const AUTHORIZATION: &str = "Authorization";
/// Declared body content type.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Advisory delay attached to injected failures.
pub const RETRY_AFTER: &str = "Retry-After";

/// The only content type the gateway accepts.
pub const APPLICATION_JSON: &str = "application/json";

/// A request as seen by the engine.
pub trait InboundRequest {
    /// HTTP method, used for logging only.
    fn method(&self) -> &str;

    /// Header value by name, matched case-insensitively.
    ///
    /// Returns `None` when the header is absent or its value is not UTF-8.
    fn header(&self, name: &str) -> Option<&str>;

    /// Raw body bytes, or `None` when the adapter could not read the body.
    fn body(&self) -> Option<&[u8]>;
}

/// Status, headers and body produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResponse {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: Vec<u8>,
}

impl EngineResponse {
    /// An empty response with the given status.
    #[must_use]
    pub const fn with_status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// A 200 response carrying a JSON document.
    #[must_use]
    pub fn json(body: Vec<u8>) -> Self {
        Self::with_status(200)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(body)
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &[(&'static str, String)] {
        &self.headers
    }

    /// First header value with the given name, case-insensitively.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    #[must_use]
    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn into_parts(self) -> (u16, Vec<(&'static str, String)>, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

/// An owned, in-memory request.
///
/// Lets the engine be driven without any HTTP stack, e.g. from tests or from
/// an embedding that already decoded the request.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    method: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl RawRequest {
    /// A `POST` with no headers and an empty body.
    #[must_use]
    pub fn post() -> Self {
        Self {
            method: "POST".to_string(),
            headers: Vec::new(),
            body: Some(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Mark the body as unreadable.
    #[must_use]
    pub fn without_body(mut self) -> Self {
        self.body = None;
        self
    }
}

impl InboundRequest for RawRequest {
    fn method(&self) -> &str {
        &self.method
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

//! Error types for configuring the mock gateway.
//!
//! Request handling never fails: every rejection becomes a status code. These
//! errors only surface from configuration calls that would otherwise store
//! state the gateway cannot express on the wire.

use thiserror::Error;

/// The standard Result type for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("status code {status} is outside the final-response range 200..=599")]
    InvalidStatusCode { status: u16 },

    #[error("status code '{value}' is not numeric")]
    NonNumericStatusCode { value: String },

    #[error("Retry-After value '{value}' is not a valid header value")]
    InvalidRetryAfter { value: String },
}

impl Error {
    /// Create an out-of-range status code error.
    pub const fn invalid_status_code(status: u16) -> Self {
        Self::InvalidStatusCode { status }
    }

    /// Create a non-numeric status code error.
    pub fn non_numeric_status_code(value: impl Into<String>) -> Self {
        Self::NonNumericStatusCode {
            value: value.into(),
        }
    }

    /// Create an invalid Retry-After error.
    pub fn invalid_retry_after(value: impl Into<String>) -> Self {
        Self::InvalidRetryAfter {
            value: value.into(),
        }
    }
}

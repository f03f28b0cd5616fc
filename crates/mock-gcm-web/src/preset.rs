//! Behaviour presets loaded from TOML.
//!
//! A preset lets a standalone mock start with errors, canonical ids and a
//! pending failure already configured:
//!
//! ```toml
//! api_key = "secrets"
//! bind_address = "127.0.0.1:8282"
//!
//! [[errors]]
//! registration_id = "42"
//! error = "NotRegistered"
//! times = 2
//!
//! [[canonical_ids]]
//! registration_id = "15"
//! canonical_id = "16"
//!
//! [next_request_failure]
//! status = 503
//! retry_after = "120"
//! ```

use std::path::Path;

use mock_gcm_core::{Engine, NextRequestFailure, Uses};
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preset {
    /// Overrides the default api key unless given on the command line.
    pub api_key: Option<String>,
    /// Overrides the default bind address unless given on the command line.
    pub bind_address: Option<String>,
    #[serde(default)]
    pub errors: Vec<ErrorPreset>,
    #[serde(default)]
    pub canonical_ids: Vec<CanonicalPreset>,
    /// Failure armed for the first request served.
    pub next_request_failure: Option<FailurePreset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorPreset {
    pub registration_id: String,
    pub error: String,
    /// Unlimited when absent.
    pub times: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanonicalPreset {
    pub registration_id: String,
    /// Id reported back for `registration_id`.
    pub canonical_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FailurePreset {
    /// Status code, as a number or numeric text.
    pub status: StatusValue,
    /// `Retry-After` header value, if any.
    pub retry_after: Option<String>,
}

/// Status code as written in the file; text must still be numeric.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    Code(u16),
    Text(String),
}

impl FailurePreset {
    fn to_failure(&self) -> Result<NextRequestFailure> {
        let retry_after = self.retry_after.clone();
        let failure = match &self.status {
            StatusValue::Code(code) => NextRequestFailure::new(*code, retry_after),
            StatusValue::Text(text) => NextRequestFailure::parse(text, retry_after),
        }?;
        Ok(failure)
    }
}

impl Preset {
    /// Read a preset file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid preset.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::ReadPreset {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse a preset from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParsePreset`] for malformed TOML or unknown keys.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Configure `engine` with every entry of this preset.
    ///
    /// The pending failure is validated before anything is applied, so a bad
    /// preset leaves the engine untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`] when the failure entry is rejected.
    pub fn apply(&self, engine: &Engine) -> Result<()> {
        let failure = self
            .next_request_failure
            .as_ref()
            .map(FailurePreset::to_failure)
            .transpose()?;

        for entry in &self.errors {
            engine.set_error_override(
                entry.registration_id.clone(),
                entry.error.clone(),
                Uses::from(entry.times),
            );
        }
        for entry in &self.canonical_ids {
            engine.set_canonical_remap(entry.registration_id.clone(), entry.canonical_id.clone());
        }
        if let Some(failure) = failure {
            engine.arm_next_request_failure(failure);
        }

        info!(
            errors = self.errors.len(),
            canonical_ids = self.canonical_ids.len(),
            "Preset applied"
        );
        Ok(())
    }
}

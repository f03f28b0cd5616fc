//! The multicast send body and its schema.

use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ledger::ReceivedMessage;

/// Upper bound on recipients in one multicast send.
pub const MAX_REGISTRATION_IDS: usize = 1000;

const DEFAULT_TIME_TO_LIVE: i128 = 1;

const DATA: &str = "data";
const REGISTRATION_IDS: &str = "registration_ids";
const COLLAPSE_KEY: &str = "collapse_key";
const TIME_TO_LIVE: &str = "time_to_live";
const DELAY_WHILE_IDLE: &str = "delay_while_idle";
const DRY_RUN: &str = "dry_run";
const RESTRICT_PACKAGE_NAME: &str = "restrict_package_name";

const KNOWN_FIELDS: [&str; 7] = [
    DATA,
    REGISTRATION_IDS,
    COLLAPSE_KEY,
    TIME_TO_LIVE,
    DELAY_WHILE_IDLE,
    DRY_RUN,
    RESTRICT_PACKAGE_NAME,
];

/// Why a body was rejected. Only logged; the wire answer is a bare 400.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("request body could not be read")]
    Unreadable,

    #[error("body is not valid JSON: {reason}")]
    Unparsable { reason: String },

    #[error("body is not a JSON object")]
    NotAnObject,

    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("registration_ids holds {count} entries, at most 1000 are allowed")]
    TooManyRegistrationIds { count: usize },

    #[error("unknown field '{field}'")]
    UnknownField { field: String },
}

/// A parsed, schema-valid multicast send.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    /// Opaque payload delivered to every recipient.
    pub data: Map<String, Value>,
    /// Recipients in request order; duplicates are processed independently.
    pub registration_ids: Vec<String>,
    /// Groups messages so only the latest is delivered.
    pub collapse_key: Option<String>,
    /// Seconds the message may wait for delivery.
    pub time_to_live: Option<i128>,
    /// Hold the message until the device is active.
    pub delay_while_idle: Option<bool>,
    /// Validate only, without delivering.
    pub dry_run: Option<bool>,
    /// Only deliver to apps with this package name.
    pub restrict_package_name: Option<String>,
}

impl SendRequest {
    /// Parse and validate a raw body.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaViolation`] found.
    pub fn parse(body: &[u8]) -> Result<Self, SchemaViolation> {
        let value: Value = serde_json::from_slice(body).map_err(|e| SchemaViolation::Unparsable {
            reason: e.to_string(),
        })?;
        Self::from_value(value)
    }

    /// Validate an already-decoded JSON document.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaViolation`] found.
    pub fn from_value(value: Value) -> Result<Self, SchemaViolation> {
        let Value::Object(mut object) = value else {
            return Err(SchemaViolation::NotAnObject);
        };

        if let Some(unknown) = object.keys().find(|key| !KNOWN_FIELDS.contains(&key.as_str())) {
            return Err(SchemaViolation::UnknownField {
                field: unknown.clone(),
            });
        }

        let data = match object.remove(DATA) {
            Some(Value::Object(data)) => data,
            Some(_) => return Err(wrong_type(DATA, "an object")),
            None => return Err(SchemaViolation::MissingField { field: DATA }),
        };

        let registration_ids = match object.remove(REGISTRATION_IDS) {
            Some(Value::Array(ids)) => registration_ids(ids)?,
            Some(_) => return Err(wrong_type(REGISTRATION_IDS, "an array of strings")),
            None => {
                return Err(SchemaViolation::MissingField {
                    field: REGISTRATION_IDS,
                });
            }
        };

        Ok(Self {
            data,
            registration_ids,
            collapse_key: optional_string(&mut object, COLLAPSE_KEY)?,
            time_to_live: optional_integer(&mut object, TIME_TO_LIVE)?,
            delay_while_idle: optional_bool(&mut object, DELAY_WHILE_IDLE)?,
            dry_run: optional_bool(&mut object, DRY_RUN)?,
            restrict_package_name: optional_string(&mut object, RESTRICT_PACKAGE_NAME)?,
        })
    }

    /// The ledger entry for one recipient of this send, defaults substituted.
    #[must_use]
    pub fn received_by(&self, registration_id: &str) -> ReceivedMessage {
        ReceivedMessage {
            registration_id: registration_id.to_string(),
            collapse_key: self.collapse_key.clone().unwrap_or_default(),
            time_to_live: self.time_to_live.unwrap_or(DEFAULT_TIME_TO_LIVE),
            delay_while_idle: self.delay_while_idle.unwrap_or_default(),
            data: self.data.clone(),
            dry_run: self.dry_run.unwrap_or_default(),
            restrict_package_name: self.restrict_package_name.clone().unwrap_or_default(),
            received_at: Utc::now(),
        }
    }
}

const fn wrong_type(field: &'static str, expected: &'static str) -> SchemaViolation {
    SchemaViolation::WrongType { field, expected }
}

fn registration_ids(ids: Vec<Value>) -> Result<Vec<String>, SchemaViolation> {
    if ids.len() > MAX_REGISTRATION_IDS {
        return Err(SchemaViolation::TooManyRegistrationIds { count: ids.len() });
    }
    ids.into_iter()
        .map(|id| match id {
            Value::String(id) => Ok(id),
            _ => Err(wrong_type(REGISTRATION_IDS, "an array of strings")),
        })
        .collect()
}

// Present-but-null counts as the wrong type, not as absent.
fn optional_string(
    object: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, SchemaViolation> {
    match object.remove(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(wrong_type(field, "a string")),
    }
}

// Any JSON integer, including those above `i64::MAX`; floats are rejected.
fn optional_integer(
    object: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<i128>, SchemaViolation> {
    match object.remove(field) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .map(Some)
            .ok_or_else(|| wrong_type(field, "an integer")),
        Some(_) => Err(wrong_type(field, "an integer")),
    }
}

fn optional_bool(
    object: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<bool>, SchemaViolation> {
    match object.remove(field) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(_) => Err(wrong_type(field, "a boolean")),
    }
}

//! Append-only log of every send the gateway accepted.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// One accepted send to one recipient.
///
/// Optional request fields are stored with their defaults substituted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceivedMessage {
    /// Recipient this copy was accepted for.
    pub registration_id: String,
    /// Collapse key, `""` when absent.
    pub collapse_key: String,
    /// Time to live, `1` when absent.
    pub time_to_live: i128,
    pub delay_while_idle: bool,
    /// Payload exactly as sent.
    pub data: Map<String, Value>,
    pub dry_run: bool,
    /// Package restriction, `""` when absent.
    pub restrict_package_name: String,
    /// When the engine accepted the send.
    pub received_at: DateTime<Utc>,
}

/// Thread-safe, ordered ledger.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: Mutex<Vec<ReceivedMessage>>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<ReceivedMessage>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, message: ReceivedMessage) {
        self.entries().push(message);
    }

    /// Append several messages without interleaving other appends between them.
    pub fn record_all(&self, messages: impl IntoIterator<Item = ReceivedMessage>) {
        self.entries().extend(messages);
    }

    /// Point-in-time copy of the ledger.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ReceivedMessage> {
        self.entries().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

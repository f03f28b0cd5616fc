//! Mutable behaviour configured by the controlling test.
//!
//! Error overrides, canonical remaps and the one-shot request failure all live
//! behind a single mutex, so each consume operation is one indivisible
//! test-and-update.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};

/// How many requests an error override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Uses {
    /// Applies to every request until replaced or cleared.
    #[default]
    Unlimited,
    /// Applies to this many more requests.
    Times(u32),
}

impl From<Option<u32>> for Uses {
    fn from(times: Option<u32>) -> Self {
        times.map_or(Self::Unlimited, Self::Times)
    }
}

/// A per-recipient simulated error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorOverride {
    /// Error string reported in the recipient's result (e.g. "NotRegistered").
    pub error: String,
    /// Uses left before the override is dropped.
    pub remaining: Uses,
}

/// A pending failure for the next request, whatever that request contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextRequestFailure {
    status: u16,
    retry_after: Option<String>,
}

impl NextRequestFailure {
    /// Build a failure record, rejecting statuses and header values the wire
    /// cannot carry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStatusCode`] outside `200..=599` and
    /// [`Error::InvalidRetryAfter`] for values that are not legal header text.
    pub fn new(status: u16, retry_after: Option<String>) -> Result<Self> {
        if !(200..=599).contains(&status) {
            return Err(Error::invalid_status_code(status));
        }
        if let Some(value) = retry_after.as_deref() {
            if !is_header_text(value) {
                return Err(Error::invalid_retry_after(value));
            }
        }
        Ok(Self {
            status,
            retry_after,
        })
    }

    /// Build a failure record from a textual status code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonNumericStatusCode`] when `status` is not an integer,
    /// otherwise the same errors as [`NextRequestFailure::new`].
    pub fn parse(status: &str, retry_after: Option<String>) -> Result<Self> {
        let code = status
            .trim()
            .parse::<u16>()
            .map_err(|_| Error::non_numeric_status_code(status))?;
        Self::new(code, retry_after)
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn retry_after(&self) -> Option<&str> {
        self.retry_after.as_deref()
    }
}

fn is_header_text(value: &str) -> bool {
    value
        .bytes()
        .all(|b| b == b'\t' || (0x20..=0x7e).contains(&b))
}

#[derive(Debug, Default)]
struct StoreState {
    errors: HashMap<String, ErrorOverride>,
    canonicals: HashMap<String, String>,
    next_failure: Option<NextRequestFailure>,
}

/// Concurrency-safe configuration store.
#[derive(Debug, Default)]
pub struct ConfigStore {
    state: Mutex<StoreState>,
}

impl ConfigStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the maps half-updated, so a
    // poisoned lock is still usable.
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace any override for `recipient`.
    pub fn set_error_override(&self, recipient: String, error: String, uses: Uses) {
        self.state().errors.insert(
            recipient,
            ErrorOverride {
                error,
                remaining: uses,
            },
        );
    }

    /// Take one use of the override for `recipient`, if any remain.
    ///
    /// A counted override is dropped once its last use is taken.
    pub fn consume_error_override(&self, recipient: &str) -> Option<String> {
        let mut state = self.state();
        let entry = state.errors.get_mut(recipient)?;
        let remaining = entry.remaining;
        match remaining {
            Uses::Unlimited => Some(entry.error.clone()),
            Uses::Times(0) => {
                state.errors.remove(recipient);
                None
            }
            Uses::Times(1) => state.errors.remove(recipient).map(|spent| spent.error),
            Uses::Times(n) => {
                entry.remaining = Uses::Times(n.saturating_sub(1));
                Some(entry.error.clone())
            }
        }
    }

    /// Replace any remap for `recipient`.
    pub fn set_canonical_remap(&self, recipient: String, canonical_id: String) {
        self.state().canonicals.insert(recipient, canonical_id);
    }

    pub fn lookup_canonical_remap(&self, recipient: &str) -> Option<String> {
        self.state().canonicals.get(recipient).cloned()
    }

    /// Replace any pending failure.
    pub fn set_next_request_failure(&self, failure: NextRequestFailure) {
        self.state().next_failure = Some(failure);
    }

    /// Read and clear the pending failure in one step.
    pub fn consume_next_request_failure(&self) -> Option<NextRequestFailure> {
        self.state().next_failure.take()
    }

    pub fn clear(&self) {
        *self.state() = StoreState::default();
    }
}

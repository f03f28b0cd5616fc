//! Per-recipient outcome synthesis for validated sends.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ledger::Ledger;
use crate::request::SendRequest;
use crate::store::ConfigStore;

/// Exclusive upper bound for generated message and multicast ids.
const ID_RANGE: u64 = 100_000_000;

/// Outcome for one recipient.
///
/// Exactly one of `message_id` and `error` is set; `registration_id` only
/// accompanies a `message_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    /// Id assigned to an accepted send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<u64>,
    /// Canonical id the caller should switch to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,
    /// Simulated error for this recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendResult {
    fn failed(error: String) -> Self {
        Self {
            message_id: None,
            registration_id: None,
            error: Some(error),
        }
    }

    fn delivered(message_id: u64, registration_id: Option<String>) -> Self {
        Self {
            message_id: Some(message_id),
            registration_id,
            error: None,
        }
    }
}

/// Body of a 200 answer to a multicast send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulticastResponse {
    /// Random id for the whole request.
    pub multicast_id: u64,
    /// Recipients accepted.
    pub success: usize,
    /// Recipients that got an error.
    pub failure: usize,
    /// Accepted recipients that carry a canonical id.
    pub canonical_ids: usize,
    /// One entry per recipient, in request order.
    pub results: Vec<SendResult>,
}

fn random_id(rng: &mut impl Rng) -> u64 {
    rng.gen_range(0..ID_RANGE)
}

/// Produce one result per recipient, in order, and record accepted sends.
///
/// An error override wins over everything: a failed recipient gets no
/// message id, no canonical id and no ledger entry.
pub fn synthesize(request: &SendRequest, store: &ConfigStore, ledger: &Ledger) -> MulticastResponse {
    let mut rng = rand::thread_rng();
    let mut success = 0_usize;
    let mut failure = 0_usize;
    let mut canonical_ids = 0_usize;
    let mut accepted = Vec::with_capacity(request.registration_ids.len());

    let results: Vec<SendResult> = request
        .registration_ids
        .iter()
        .map(|registration_id| {
            if let Some(error) = store.consume_error_override(registration_id) {
                debug!(registration_id = %registration_id, error = %error, "Error override applied");
                failure = failure.saturating_add(1);
                return SendResult::failed(error);
            }

            success = success.saturating_add(1);
            accepted.push(request.received_by(registration_id));

            let canonical = store.lookup_canonical_remap(registration_id);
            if let Some(canonical_id) = canonical.as_deref() {
                debug!(
                    registration_id = %registration_id,
                    canonical_id = %canonical_id,
                    "Canonical id returned"
                );
                canonical_ids = canonical_ids.saturating_add(1);
            }
            SendResult::delivered(random_id(&mut rng), canonical)
        })
        .collect();

    ledger.record_all(accepted);

    MulticastResponse {
        multicast_id: random_id(&mut rng),
        success,
        failure,
        canonical_ids,
        results,
    }
}

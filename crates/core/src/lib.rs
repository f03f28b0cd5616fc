//! Mock GCM engine
//!
//! The stateful core of a push-gateway test double: it validates multicast
//! send requests, synthesizes per-recipient outcomes from test-configured
//! behaviour, and records every accepted send for later inspection.
//!
//! The engine knows nothing about sockets or HTTP framing. Adapters implement
//! [`InboundRequest`] and write back the [`EngineResponse`] they get.

#![forbid(unsafe_code)]
#![cfg_attr(not(test), forbid(clippy::unwrap_used))]
#![cfg_attr(not(test), forbid(clippy::panic))]
#![cfg_attr(test, deny(clippy::unwrap_used, clippy::panic))]
#![deny(clippy::expect_used)]

pub mod engine;
pub mod error;
pub mod interface;
pub mod ledger;
pub mod outcome;
pub mod request;
pub mod store;
pub mod validation;

pub use engine::Engine;
pub use error::{Error, Result};
pub use interface::{EngineResponse, InboundRequest, RawRequest};
pub use ledger::{Ledger, ReceivedMessage};
pub use outcome::{MulticastResponse, SendResult};
pub use request::{MAX_REGISTRATION_IDS, SchemaViolation, SendRequest};
pub use store::{ConfigStore, ErrorOverride, NextRequestFailure, Uses};
pub use validation::{Rejection, RequestValidator};

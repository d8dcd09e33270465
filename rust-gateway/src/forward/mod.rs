//! Forwarding module for delivering interactions to n8n.
//!
//! Delivery is best effort: one attempt, bounded by a timeout, with the
//! outcome only logged. The Discord acknowledgement never depends on it.

pub mod forwarder;
pub mod types;

pub use forwarder::Forwarder;
pub use types::{ForwardEnvelope, ForwardError, ForwardOutcome, SECRET_HEADER};

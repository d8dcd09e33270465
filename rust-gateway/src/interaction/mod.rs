//! Interaction module: the per-request pipeline behind the HTTP endpoint.
//!
//! ## Flow
//!
//! ```text
//! Discord → verify → parse → PING? → custom_id → route → spawn forward → ACK
//! ```

pub mod handler;
pub mod types;

pub use handler::{Accepted, InteractionHandler};
pub use types::{ErrorResponse, Interaction, InteractionError, InteractionResponse, PING};

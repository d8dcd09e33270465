//! Discord Gateway - signature-verifying relay from Discord to n8n.
//!
//! Discord posts interaction callbacks (button clicks, commands) to this
//! gateway. Each one is authenticated, routed by its `custom_id` and
//! forwarded to an n8n webhook, while Discord gets an immediate
//! acknowledgement.
//!
//! ## Architecture
//!
//! ```text
//! Discord → web (verify) → interaction → routing (webhook_map.json) → forward → n8n
//! ```

pub mod config;
pub mod forward;
pub mod interaction;
pub mod routing;
pub mod web;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use forward::{ForwardEnvelope, ForwardError, Forwarder};
pub use interaction::{InteractionError, InteractionHandler, InteractionResponse};
pub use routing::{
    Destination, FileRoutingTable, Metadata, RoutingTable, RoutingTableProvider, WebhookResolver,
};
pub use web::AppState;

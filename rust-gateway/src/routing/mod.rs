//! Routing module: from a component `custom_id` to an n8n webhook.
//!
//! ```text
//! custom_id → Metadata → candidate keys → RoutingTable → Destination
//! ```

pub mod metadata;
pub mod resolver;
pub mod table;

pub use metadata::Metadata;
pub use resolver::{Destination, Environment, WebhookResolver};
pub use table::{
    FileRoutingTable, RoutingEntry, RoutingRecord, RoutingTable, RoutingTableError,
    RoutingTableProvider, StaticRoutingTable,
};

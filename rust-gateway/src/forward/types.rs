//! Message types sent to n8n.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::routing::Metadata;

/// Header n8n checks to authenticate the gateway.
pub const SECRET_HEADER: &str = "X-N8N-Webhook-Auth";

/// Body POSTed to the n8n webhook.
///
/// The interaction is passed through untouched next to the metadata parsed
/// from its `custom_id`.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardEnvelope {
    pub interaction: Map<String, Value>,
    pub meta: Metadata,
}

impl ForwardEnvelope {
    pub fn new(interaction: Map<String, Value>, meta: Metadata) -> Self {
        Self { interaction, meta }
    }
}

/// Why a forward did not reach n8n successfully.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("n8n responded with status {0}")]
    Status(u16),
}

impl From<reqwest::Error> for ForwardError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(e)
        }
    }
}

/// HTTP status of a successful forward, or why it failed.
pub type ForwardOutcome = Result<u16, ForwardError>;

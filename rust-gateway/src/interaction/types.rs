//! Discord interaction payloads, responses and rejections.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Interaction type Discord uses for its endpoint liveness check.
pub const PING: u64 = 1;

/// An inbound interaction, kept as the raw JSON object.
///
/// Only `id`, `type` and `data.custom_id` are inspected; everything is
/// forwarded verbatim.
#[derive(Debug, Clone)]
pub struct Interaction(Map<String, Value>);

impl Interaction {
    /// Decode the raw request body. The body must be a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self, InteractionError> {
        match serde_json::from_slice(body) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(InteractionError::InvalidJson(
                "interaction body must be a JSON object".to_string(),
            )),
            Err(e) => Err(InteractionError::InvalidJson(e.to_string())),
        }
    }

    pub fn id(&self) -> Option<&Value> {
        self.0.get("id")
    }

    pub fn kind(&self) -> Option<u64> {
        self.0.get("type").and_then(Value::as_u64)
    }

    pub fn is_ping(&self) -> bool {
        self.kind() == Some(PING)
    }

    /// `data.custom_id`, or an empty string when absent or not a string.
    pub fn custom_id(&self) -> &str {
        self.0
            .get("data")
            .and_then(|data| data.get("custom_id"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Response body Discord expects from an interaction endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
}

impl InteractionResponse {
    /// Answer to a PING.
    pub const PONG: Self = Self { kind: 1 };

    /// Deferred channel message: processing continues elsewhere.
    pub const DEFERRED: Self = Self { kind: 5 };
}

impl IntoResponse for InteractionResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Error body, shaped like `{"detail": "..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Rejections returned to Discord before any routing happens.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("Missing signature headers")]
    MissingSignatureHeaders,

    #[error("Invalid request signature")]
    InvalidSignature,

    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),
}

impl InteractionError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingSignatureHeaders | Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for InteractionError {
    fn into_response(self) -> Response {
        let detail = match &self {
            Self::InvalidJson(_) => "Invalid JSON body".to_string(),
            other => other.to_string(),
        };
        (self.status(), Json(ErrorResponse { detail })).into_response()
    }
}

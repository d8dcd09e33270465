//! HTTP endpoint handlers.
//!
//! The interaction endpoint is a thin shim: it pulls the signature headers
//! and raw body out of the request and hands them to [`InteractionHandler`].

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use crate::interaction::{InteractionError, InteractionHandler, InteractionResponse};
use crate::web::signature::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub handler: Arc<InteractionHandler>,
}

impl AppState {
    pub fn new(config: Config, handler: InteractionHandler) -> Self {
        Self {
            config: Arc::new(config),
            handler: Arc::new(handler),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Discord Interactions
// =============================================================================

/// Discord interactions endpoint.
///
/// Responds `{"type":1}` to PINGs and `{"type":5}` to everything else that
/// is signed and valid JSON. 401 for missing or bad signatures, 400 for
/// malformed bodies.
pub async fn interactions(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<InteractionResponse, InteractionError> {
    let signature = header_str(&headers, SIGNATURE_HEADER);
    let timestamp = header_str(&headers, TIMESTAMP_HEADER);

    state.handler.handle(signature, timestamp, &body)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

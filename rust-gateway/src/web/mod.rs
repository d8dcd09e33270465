//! Web server module for handling Discord interactions.
//!
//! This module provides a thin web server that:
//! - Receives interaction callbacks from Discord
//! - Verifies the Ed25519 signature
//! - Acknowledges immediately while the interaction is forwarded to n8n
//!
//! The interaction endpoint is mounted under the same path layout n8n uses,
//! so Discord can point at the gateway instead of n8n directly.

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};

use crate::routing::Environment;

pub use handlers::{health, interactions, AppState, HealthResponse};
pub use signature::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

/// Paths the interaction endpoint is served on.
///
/// `/webhook/{relay_path}` and `/webhook-test/{relay_path}`, each with and
/// without a trailing slash.
pub fn interaction_paths(relay_path: &str) -> Vec<String> {
    [Environment::Prod, Environment::Test]
        .into_iter()
        .flat_map(|env| {
            let base = if relay_path.is_empty() {
                format!("/{}", env.path_prefix())
            } else {
                format!("/{}/{}", env.path_prefix(), relay_path)
            };
            [format!("{base}/"), base]
        })
        .collect()
}

/// Build the router for the gateway.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new().route("/health", get(health));

    for path in interaction_paths(&state.config.webhook_path) {
        router = router.route(&path, post(interactions));
    }

    router.with_state(state)
}

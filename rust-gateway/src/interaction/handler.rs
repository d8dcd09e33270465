//! Interaction handling: verify, acknowledge, route and forward.
//!
//! For every request the handler:
//! 1. Rejects it unless the Ed25519 signature checks out
//! 2. Rejects bodies that are not a JSON object
//! 3. Answers PINGs directly
//! 4. Resolves the n8n webhook from `data.custom_id`
//! 5. Spawns the forward and returns the deferred acknowledgement
//!
//! Nothing after step 2 can turn into an error response. Discord only ever
//! sees the acknowledgement, whatever happens to the forward.
//!
//! Spawned forwards are tracked so shutdown can wait for them with
//! [`InteractionHandler::drain`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use super::types::{Interaction, InteractionError, InteractionResponse};
use crate::forward::{ForwardEnvelope, ForwardOutcome, Forwarder};
use crate::routing::{Metadata, RoutingTableProvider, WebhookResolver};
use crate::web::signature::SignatureVerifier;

/// An interaction that passed verification and parsing.
#[derive(Debug)]
pub struct Accepted {
    pub response: InteractionResponse,
    /// Spawned forward to n8n, `None` for PINGs. Dropping the handle does not
    /// stop the task.
    pub forward: Option<JoinHandle<ForwardOutcome>>,
}

/// Composes verification, routing and forwarding for one request at a time.
pub struct InteractionHandler {
    verifier: SignatureVerifier,
    routes: Arc<dyn RoutingTableProvider>,
    resolver: WebhookResolver,
    forwarder: Forwarder,
    forwards: TaskTracker,
}

impl InteractionHandler {
    pub fn new(
        verifier: SignatureVerifier,
        routes: Arc<dyn RoutingTableProvider>,
        resolver: WebhookResolver,
        forwarder: Forwarder,
    ) -> Self {
        Self {
            verifier,
            routes,
            resolver,
            forwarder,
            forwards: TaskTracker::new(),
        }
    }

    /// Number of forwards still running.
    pub fn pending_forwards(&self) -> usize {
        self.forwards.len()
    }

    /// Stop accepting new forwards and wait up to `timeout` for running ones.
    ///
    /// Returns `false` if forwards were still running when the timeout hit.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.forwards.close();
        let pending = self.forwards.len();

        match tokio::time::timeout(timeout, self.forwards.wait()).await {
            Ok(()) => {
                info!(pending, "forwards_drained");
                true
            }
            Err(_) => {
                warn!(
                    abandoned = self.forwards.len(),
                    timeout_seconds = timeout.as_secs_f64(),
                    "forwards_drain_timeout"
                );
                false
            }
        }
    }

    /// Handle one request and return the response for Discord.
    pub fn handle(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> Result<InteractionResponse, InteractionError> {
        self.accept(signature, timestamp, body)
            .map(|accepted| accepted.response)
    }

    /// Like [`handle`](Self::handle), but also returns the spawned forward.
    ///
    /// Must be called from within a tokio runtime.
    pub fn accept(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> Result<Accepted, InteractionError> {
        let (signature, timestamp) = match (signature, timestamp) {
            (Some(sig), Some(ts)) if !sig.is_empty() && !ts.is_empty() => (sig, ts),
            _ => {
                warn!("missing_signature_headers");
                return Err(InteractionError::MissingSignatureHeaders);
            }
        };

        if !self.verifier.verify(signature, timestamp, body) {
            warn!(signature = %signature, timestamp = %timestamp, "invalid_signature");
            return Err(InteractionError::InvalidSignature);
        }

        let interaction = Interaction::from_slice(body).map_err(|e| {
            warn!(error = %e, body_length = body.len(), "json_parse_error");
            e
        })?;

        info!(
            id = ?interaction.id(),
            interaction_type = ?interaction.kind(),
            custom_id = %interaction.custom_id(),
            "interaction_received"
        );

        if interaction.is_ping() {
            info!("ping_received");
            return Ok(Accepted {
                response: InteractionResponse::PONG,
                forward: None,
            });
        }

        let custom_id = interaction.custom_id().to_string();
        let meta = Metadata::parse(&custom_id);
        info!(
            workflow = ?meta.workflow,
            reference = ?meta.reference,
            action = ?meta.action,
            "metadata_parsed"
        );

        let table = self.routes.current();
        let destination = self.resolver.resolve(&meta, &table);
        info!(
            custom_id = %custom_id,
            meta = ?meta,
            target_webhook = %destination,
            "webhook_resolved"
        );

        let envelope = ForwardEnvelope::new(interaction.into_inner(), meta);
        let forwarder = self.forwarder.clone();
        let forward = self
            .forwards
            .spawn(async move { forwarder.forward(&destination, &envelope).await });

        info!("ack_sent");
        Ok(Accepted {
            response: InteractionResponse::DEFERRED,
            forward: Some(forward),
        })
    }
}

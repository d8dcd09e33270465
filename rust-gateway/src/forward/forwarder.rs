//! Single-attempt delivery of interactions to n8n.

use std::time::Duration;

use reqwest::Client;
use tracing::{error, info};

use super::types::{ForwardEnvelope, ForwardError, ForwardOutcome, SECRET_HEADER};
use crate::routing::Destination;

/// POSTs interactions to n8n webhooks.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: Client,
    secret: String,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(client: Client, secret: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            secret: secret.into(),
            timeout,
        }
    }

    /// Deliver `envelope` to `destination` once.
    ///
    /// Network errors, timeouts and non-2xx responses are logged and returned
    /// as [`ForwardError`]. Nothing is retried.
    pub async fn forward(
        &self,
        destination: &Destination,
        envelope: &ForwardEnvelope,
    ) -> ForwardOutcome {
        let outcome = self.send(destination, envelope).await;

        match &outcome {
            Ok(status) => {
                info!(
                    target_webhook = %destination,
                    status_code = status,
                    meta = ?envelope.meta,
                    "forward_success"
                );
            }
            Err(e) => {
                error!(
                    target_webhook = %destination,
                    timeout_seconds = self.timeout.as_secs_f64(),
                    error = %e,
                    meta = ?envelope.meta,
                    "forward_error"
                );
            }
        }

        outcome
    }

    async fn send(&self, destination: &Destination, envelope: &ForwardEnvelope) -> ForwardOutcome {
        let response = self
            .client
            .post(&destination.url)
            .timeout(self.timeout)
            .header(SECRET_HEADER, &self.secret)
            .json(envelope)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(ForwardError::Status(status.as_u16()))
        }
    }
}

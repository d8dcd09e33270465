//! Discord Gateway - relay from Discord interactions to n8n webhooks.
//!
//! This binary provides a thin, fast web server that:
//! - Receives interaction callbacks from Discord
//! - Verifies the Ed25519 request signature
//! - Acknowledges immediately and forwards the interaction to n8n
//!
//! Routing is read from `webhook_map.json` and picked up on change without
//! a restart.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gateway::routing::{FileRoutingTable, RoutingTableProvider, WebhookResolver};
use gateway::web::{self, AppState};
use gateway::{Config, Forwarder, InteractionHandler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("gateway_starting");

    // Load configuration; a missing secret or key stops the process here
    let config = Config::from_env().inspect_err(|e| error!(error = %e, "config_invalid"))?;
    let verifier = config
        .signature_verifier()
        .inspect_err(|e| error!(error = %e, "config_invalid"))?;

    info!(
        port = config.port,
        n8n_domain = %config.n8n_domain,
        webhook_path = %config.webhook_path,
        webhook_map_file = %config.webhook_map_file.display(),
        forward_timeout_ms = config.forward_timeout_ms,
        "config_loaded"
    );

    // Load the routing table once up front so problems show at startup
    let routes = Arc::new(FileRoutingTable::new(config.webhook_map_file.clone()));
    info!(
        path = %config.webhook_map_file.display(),
        entries = routes.current().len(),
        "routing_table_ready"
    );

    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let handler = InteractionHandler::new(
        verifier,
        routes,
        WebhookResolver::new(&config.n8n_domain, &config.webhook_path),
        Forwarder::new(client, &config.n8n_webhook_secret, config.forward_timeout()),
    );

    let port = config.port;
    let drain_timeout = config.forward_timeout();
    let state = AppState::new(config, handler);
    let handler = Arc::clone(&state.handler);

    // Build the router
    let app = web::router(state).layer(TraceLayer::new_for_http());

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "gateway_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Let in-flight forwards finish or time out so their outcome is logged
    handler.drain(drain_timeout).await;

    info!("gateway_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("gateway_shutting_down");
}

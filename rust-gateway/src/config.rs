//! Configuration module for environment variable parsing.
//!
//! Everything is read from environment variables. The n8n shared secret and
//! the Discord public key are required; the gateway refuses to start without
//! them.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::web::signature::SignatureVerifier;

const DEFAULT_N8N_DOMAIN: &str = "http://n8n:5678";
const DEFAULT_WEBHOOK_PATH: &str = "discord/interactions";
const DEFAULT_WEBHOOK_MAP_FILE: &str = "data/webhook_map.json";

/// Fatal configuration problems detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set. This gateway requires it to run")]
    Missing(&'static str),

    #[error("DISCORD_PUBLIC_KEY is not a valid Ed25519 public key: {0}")]
    InvalidPublicKey(String),

    #[error("N8N_DOMAIN is not a valid URL: {0}")]
    InvalidDomain(#[from] url::ParseError),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hex-encoded Ed25519 public key from the Discord developer portal
    pub discord_public_key: String,

    /// Base URL of the n8n instance, without trailing slash
    pub n8n_domain: String,

    /// Relay path segment shared by the inbound routes and the n8n webhooks
    pub webhook_path: String,

    /// Path of the JSON routing table
    pub webhook_map_file: PathBuf,

    /// Shared secret sent to n8n in `X-N8N-Webhook-Auth`
    pub n8n_webhook_secret: String,

    /// Timeout for a single forward to n8n in milliseconds
    pub forward_timeout_ms: u64,

    /// Port for the web server to listen on
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let n8n_webhook_secret = lookup("N8N_WEBHOOK_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("N8N_WEBHOOK_SECRET"))?;

        let discord_public_key = lookup("DISCORD_PUBLIC_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DISCORD_PUBLIC_KEY"))?;

        let n8n_domain = lookup("N8N_DOMAIN")
            .unwrap_or_else(|| DEFAULT_N8N_DOMAIN.to_string())
            .trim_end_matches('/')
            .to_string();
        Url::parse(&n8n_domain)?;

        let webhook_path = lookup("DISCORD_WEBHOOK_PATH")
            .unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_string())
            .trim_matches('/')
            .to_string();

        Ok(Config {
            discord_public_key,
            n8n_domain,
            webhook_path,

            webhook_map_file: lookup("WEBHOOK_MAP_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WEBHOOK_MAP_FILE)),

            n8n_webhook_secret,

            forward_timeout_ms: parse_or("FORWARD_TIMEOUT_MS", lookup("FORWARD_TIMEOUT_MS"), 5000),

            port: parse_or("PORT", lookup("PORT"), 8080),
        })
    }

    /// Build the signature verifier for the configured public key.
    pub fn signature_verifier(&self) -> Result<SignatureVerifier, ConfigError> {
        SignatureVerifier::from_hex(&self.discord_public_key)
            .map_err(|e| ConfigError::InvalidPublicKey(e.to_string()))
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_millis(self.forward_timeout_ms)
    }
}

/// Parse an optional raw value, falling back to `default` when absent or invalid.
fn parse_or<T: std::str::FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "invalid_config_value_using_default");
            default
        }
    }
}

//! Helpers shared by the unit tests.

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::web::signature::SignatureVerifier;

pub const TIMESTAMP: &str = "1700000000";

/// A Discord-like application key pair.
pub struct TestKeys {
    signing_key: SigningKey,
}

impl TestKeys {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self {
            signing_key: SigningKey::from_bytes(&bytes),
        }
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().as_bytes())
    }

    pub fn verifier(&self) -> SignatureVerifier {
        SignatureVerifier::new(self.signing_key.verifying_key())
    }

    /// Hex signature over `timestamp || body`, as Discord sends it.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> String {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        hex::encode(self.signing_key.sign(&message).to_bytes())
    }
}

/// Base URL of a local port with nothing listening on it.
pub fn unreachable_base_url() -> String {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .unwrap();
    format!("http://127.0.0.1:{port}")
}

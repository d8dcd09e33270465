//! Discord interaction signature verification.
//!
//! Discord signs every interaction request with Ed25519 over
//! `timestamp || body` and sends the result in `X-Signature-Ed25519`.
//! Reference: https://discord.com/developers/docs/interactions/overview#setting-up-an-endpoint-validating-security-request-headers

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;
use tracing::debug;

/// Header carrying the hex-encoded Ed25519 signature.
pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";

/// Header carrying the timestamp that was signed along with the body.
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

/// Problems with the configured public key.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("public key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("public key must be 32 bytes, got {0}")]
    Length(usize),

    #[error("public key is not a valid Ed25519 point: {0}")]
    Point(#[from] ed25519_dalek::SignatureError),
}

/// Verifies inbound requests against the application's public key.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    /// Load the verifier from a hex-encoded public key.
    pub fn from_hex(public_key_hex: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(public_key_hex.trim())?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::Length(bytes.len()))?;

        Ok(Self {
            key: VerifyingKey::from_bytes(&bytes)?,
        })
    }

    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Verify a request signature.
    ///
    /// The signed message is the timestamp bytes followed directly by the raw
    /// body. Malformed hex, a signature that is not 64 bytes and a
    /// cryptographic mismatch all yield `false`.
    pub fn verify(&self, signature_hex: &str, timestamp: &str, body: &[u8]) -> bool {
        let signature_bytes = match hex::decode(signature_hex) {
            Ok(b) => b,
            Err(e) => {
                debug!(error = %e, "signature_invalid_hex");
                return false;
            }
        };

        let signature = match Signature::from_slice(&signature_bytes) {
            Ok(s) => s,
            Err(_) => {
                debug!(length = signature_bytes.len(), "signature_invalid_length");
                return false;
            }
        };

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key.verify(&message, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;
    use rand::RngCore;

    const TIMESTAMP: &str = "1700000000";
    const BODY: &[u8] = br#"{"id":"123","type":3,"data":{"custom_id":"wf:ref:act"}}"#;

    fn generate_signing_key() -> SigningKey {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        SigningKey::from_bytes(&bytes)
    }

    fn sign(key: &SigningKey, timestamp: &str, body: &[u8]) -> String {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        hex::encode(key.sign(&message).to_bytes())
    }

    fn flip_bit(bytes: &mut [u8], bit: usize) {
        bytes[bit / 8] ^= 1 << (bit % 8);
    }

    #[test]
    fn test_verify_valid_signature() {
        let key = generate_signing_key();
        let verifier = SignatureVerifier::from_hex(&hex::encode(key.verifying_key().as_bytes()))
            .unwrap();

        assert!(verifier.verify(&sign(&key, TIMESTAMP, BODY), TIMESTAMP, BODY));
    }

    #[test]
    fn test_verify_rejects_signature_bit_flips() {
        let key = generate_signing_key();
        let verifier = SignatureVerifier::new(key.verifying_key());
        let signature = hex::decode(sign(&key, TIMESTAMP, BODY)).unwrap();

        for bit in [0, 7, 100, 255, 256, 511] {
            let mut mutated = signature.clone();
            flip_bit(&mut mutated, bit);
            assert!(
                !verifier.verify(&hex::encode(&mutated), TIMESTAMP, BODY),
                "bit {bit} flip accepted"
            );
        }
    }

    #[test]
    fn test_verify_rejects_timestamp_and_body_bit_flips() {
        let key = generate_signing_key();
        let verifier = SignatureVerifier::new(key.verifying_key());
        let signature = sign(&key, TIMESTAMP, BODY);

        let mut timestamp = TIMESTAMP.as_bytes().to_vec();
        flip_bit(&mut timestamp, 0);
        let timestamp = String::from_utf8(timestamp).unwrap();
        assert!(!verifier.verify(&signature, &timestamp, BODY));

        for bit in [0, 9, BODY.len() * 8 - 1] {
            let mut body = BODY.to_vec();
            flip_bit(&mut body, bit);
            assert!(!verifier.verify(&signature, TIMESTAMP, &body));
        }
    }

    #[test]
    fn test_signed_message_has_no_separator() {
        let key = generate_signing_key();
        let verifier = SignatureVerifier::new(key.verifying_key());
        let signature = sign(&key, "17", b"00");

        assert!(verifier.verify(&signature, "17", b"00"));
        assert!(verifier.verify(&signature, "1", b"700"));
        assert!(!verifier.verify(&signature, "17", b"01"));
    }

    #[test]
    fn test_verify_rejects_malformed_signatures() {
        let key = generate_signing_key();
        let verifier = SignatureVerifier::new(key.verifying_key());

        assert!(!verifier.verify("not-hex", TIMESTAMP, BODY));
        assert!(!verifier.verify("", TIMESTAMP, BODY));
        assert!(!verifier.verify("abcd", TIMESTAMP, BODY));
        assert!(!verifier.verify(&"00".repeat(65), TIMESTAMP, BODY));
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let signer = generate_signing_key();
        let other = generate_signing_key();
        let verifier = SignatureVerifier::new(other.verifying_key());

        assert!(!verifier.verify(&sign(&signer, TIMESTAMP, BODY), TIMESTAMP, BODY));
    }

    #[test]
    fn test_from_hex_errors() {
        assert!(matches!(SignatureVerifier::from_hex("xyz"), Err(KeyError::Hex(_))));
        assert!(matches!(SignatureVerifier::from_hex("abcd"), Err(KeyError::Length(2))));
    }
}

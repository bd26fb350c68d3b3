//! HMAC-SHA256 verification of push webhook deliveries.
//!
//! Forgejo and Gitea sign the raw request body with the hook secret and send
//! the lowercase hex digest in `X-Forgejo-Signature` / `X-Gitea-Signature`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::ports::WebhookVerifier;

type HmacSha256 = Hmac<Sha256>;

/// Verifies hex HMAC-SHA256 signatures against a shared secret.
///
/// Fails closed: with no secret configured every delivery is rejected.
pub struct HmacSha256Verifier {
    secret: Option<SecretString>,
}

impl HmacSha256Verifier {
    pub fn new(secret: Option<SecretString>) -> Self {
        let secret = secret.filter(|s| !s.expose_secret().is_empty());
        if secret.is_none() {
            tracing::warn!("No webhook secret configured; all push deliveries will be rejected");
        }
        Self { secret }
    }

    /// Hex signature of `body` under `secret`.
    pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(body);
        Some(hex_encode(&mac.finalize().into_bytes()))
    }
}

impl WebhookVerifier for HmacSha256Verifier {
    fn verify(&self, body: &[u8], signature: &str) -> bool {
        let Some(secret) = &self.secret else {
            return false;
        };
        let Some(expected) = Self::sign(secret.expose_secret(), body) else {
            return false;
        };

        let provided = signature.trim().to_ascii_lowercase();
        expected.as_bytes().ct_eq(provided.as_bytes()).into()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

//! WebhookVerifier port - Authenticates inbound webhook deliveries.

/// Checks a delivery signature against the raw request body.
///
/// Implementations must fail closed: with no secret configured every
/// delivery is rejected.
pub trait WebhookVerifier: Send + Sync {
    fn verify(&self, body: &[u8], signature: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_verifier_is_object_safe() {
        fn _accepts_dyn(_verifier: &dyn WebhookVerifier) {}
    }
}

//! Signed GitHub push webhooks.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying `sha256=<hex>`.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
/// Header naming the event type.
pub const EVENT_HEADER: &str = "x-github-event";

/// `sha256=<hex>` signature of `body` under `secret`.
#[must_use]
pub fn sign(secret: &str, body: &[u8]) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Check a signature header against `body` in constant time.
///
/// A missing header, a different scheme or malformed hex all fail.
#[must_use]
pub fn verify_signature(secret: &str, header: Option<&str>, body: &[u8]) -> bool {
    let Some(signature) = header.and_then(|h| h.trim().strip_prefix("sha256=")) else {
        return false;
    };
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// The fields of a push event used for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushEvent {
    /// Full ref name, e.g. `refs/heads/main`.
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Commit before the push.
    #[serde(default)]
    pub before: String,
    /// Commit after the push.
    pub after: String,
}

impl PushEvent {
    /// Parse a push payload.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for a malformed payload.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Branch name for `refs/heads/*` refs.
    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        self.git_ref.strip_prefix("refs/heads/")
    }

    /// Whether the push targets `branch`.
    #[must_use]
    pub fn is_branch(&self, branch: &str) -> bool {
        self.branch() == Some(branch)
    }
}

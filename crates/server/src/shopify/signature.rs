//! Webhook HMAC verification.
//!
//! Shopify signs each webhook delivery with HMAC-SHA256 over the raw request
//! body and sends the base64-encoded digest in `X-Shopify-Hmac-Sha256`.
//! Verification must run over the exact bytes received - never a
//! reparse-then-reserialize of the JSON.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a webhook signature against the shared secret.
///
/// Returns `false` (never errors) when the secret is empty, the supplied
/// signature is absent, or the signature does not decode as base64. The
/// digest comparison itself is constant-time via [`Mac::verify_slice`].
#[must_use]
pub fn verify_webhook_signature(
    raw_body: &[u8],
    supplied_signature: Option<&str>,
    secret: &str,
) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Some(supplied) = supplied_signature else {
        return false;
    };
    let Ok(supplied_digest) = BASE64.decode(supplied) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&supplied_digest).is_ok()
}

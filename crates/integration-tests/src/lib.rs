//! Integration test helpers for QBridge.
//!
//! These tests exercise a running server over HTTP and are `#[ignore]`d by
//! default. To run them:
//!
//! ```bash
//! # Start PostgreSQL and the server
//! cargo run -p qbridge-server
//!
//! # Run against it
//! OMS_BASE_URL=http://localhost:8000 \
//! ADMIN_API_KEY=... SHOPIFY_WEBHOOK_SECRET=... \
//! cargo test -p qbridge-integration-tests -- --ignored
//! ```
//!
//! `ADMIN_API_KEY` and `SHOPIFY_WEBHOOK_SECRET` must match the server's own
//! environment, or every request will be rejected.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("OMS_BASE_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

/// Admin API key shared with the server under test.
#[must_use]
pub fn admin_key() -> String {
    std::env::var("ADMIN_API_KEY").unwrap_or_else(|_| "test-admin-key".to_string())
}

/// Webhook secret shared with the server under test.
#[must_use]
pub fn webhook_secret() -> String {
    std::env::var("SHOPIFY_WEBHOOK_SECRET").unwrap_or_else(|_| "test-webhook-secret".to_string())
}

/// Plain HTTP client.
#[must_use]
pub fn client() -> Client {
    Client::new()
}

/// Compute the base64 HMAC-SHA256 signature Shopify would send for `body`.
///
/// # Panics
///
/// Panics if the secret cannot key the MAC (HMAC accepts any key length, so
/// this does not happen in practice).
#[must_use]
pub fn sign_webhook(secret: &str, body: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}

/// POST a signed webhook delivery and return the response.
///
/// # Panics
///
/// Panics if the request cannot be sent.
pub async fn post_webhook(
    client: &Client,
    path: &str,
    webhook_id: &str,
    body: &serde_json::Value,
) -> reqwest::Response {
    let raw = serde_json::to_vec(body).expect("serializable body");
    let signature = sign_webhook(&webhook_secret(), &raw);
    client
        .post(format!("{}{path}", base_url()))
        .header("X-Shopify-Hmac-Sha256", signature)
        .header("X-Shopify-Webhook-Id", webhook_id)
        .header("X-Shopify-Shop-Domain", "qbridge-test.myshopify.com")
        .header("Content-Type", "application/json")
        .body(raw)
        .send()
        .await
        .expect("Failed to send webhook")
}

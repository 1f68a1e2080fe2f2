//! Shopify integration: webhook signature verification.

pub mod signature;

pub use signature::verify_webhook_signature;

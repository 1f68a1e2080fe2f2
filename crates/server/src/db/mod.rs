//! Database operations for the OMS `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `customers`, `addresses` - Buyer contact data from order-create webhooks
//! - `products`, `skus`, `inventory` - Catalog and stock levels
//! - `orders`, `order_items`, `payments` - Order lifecycle records
//! - `shipments`, `returns` - Fulfillment lifecycle records (admin surface)
//! - `webhook_events` - Append-only dedup ledger keyed by webhook id
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and are embedded with
//! `sqlx::migrate!`, run automatically at server startup.
//!
//! # Transactions
//!
//! Repository methods that participate in a handler-scoped transaction take
//! `&mut PgConnection` so the caller controls the commit point. A webhook
//! delivery's ledger check, entity writes, inventory mutation, and ledger
//! append all ride one transaction.

pub mod catalog;
pub mod inventory;
pub mod orders;
pub mod webhook_events;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;
pub use inventory::InventoryLedger;
pub use orders::OrderRepository;
pub use webhook_events::WebhookEventLedger;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique SKU code).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A mutation would violate a business invariant (e.g., negative inventory).
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

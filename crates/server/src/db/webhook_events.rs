//! The webhook dedup ledger.
//!
//! One row per externally-supplied webhook id; the UNIQUE constraint on
//! `webhook_id` is the race backstop. Rows are never updated or deleted.
//! Both operations run inside the delivery's transaction so a concurrent
//! duplicate either sees the committed row (and short-circuits) or aborts on
//! the constraint at commit - no delivery partially applies.

use sqlx::PgConnection;

use super::RepositoryError;

/// Namespace for ledger operations.
pub struct WebhookEventLedger;

impl WebhookEventLedger {
    /// Whether a delivery with this webhook id has already been recorded.
    ///
    /// # Errors
    ///
    /// Returns `Database` on query failure.
    pub async fn exists(
        conn: &mut PgConnection,
        webhook_id: &str,
    ) -> Result<bool, RepositoryError> {
        let row: Option<i32> = sqlx::query_scalar("SELECT 1 FROM webhook_events WHERE webhook_id = $1")
            .bind(webhook_id)
            .fetch_optional(conn)
            .await?;
        Ok(row.is_some())
    }

    /// Append a ledger row. Final step of every successful handling path,
    /// including early-exit "ignored" outcomes.
    ///
    /// # Errors
    ///
    /// Returns `Database` on query failure (including a lost dedup race
    /// against the unique constraint).
    pub async fn append(
        conn: &mut PgConnection,
        shop_domain: &str,
        topic: &str,
        webhook_id: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO webhook_events (shop_domain, topic, webhook_id) VALUES ($1, $2, $3)")
            .bind(shop_domain)
            .bind(topic)
            .bind(webhook_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}

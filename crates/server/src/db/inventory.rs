//! The inventory ledger: every mutation of `qty_on_hand` / `qty_reserved`
//! goes through this module.
//!
//! Two distinct failure policies coexist here and must not be unified:
//!
//! - [`InventoryLedger::adjust`] is strict: it rejects any delta that would
//!   drive a quantity negative. This is the admin-facing path.
//! - [`InventoryLedger::reserve_for_order`] and
//!   [`InventoryLedger::release_on_payment`] are lenient: unknown SKUs and
//!   capacity shortfalls are silently skipped, and releases clamp at zero.
//!   These run inside the webhook pipeline, which must never fail a delivery
//!   over a business mismatch.
//!
//! All operations take `&mut PgConnection` and read the inventory row with
//! `FOR UPDATE`, so concurrent mutations of the same SKU serialize on the row
//! lock inside the caller's transaction.

use sqlx::PgConnection;

use qbridge_core::SkuId;

use super::RepositoryError;

/// Inventory counters after a mutation, as reported back to admin clients.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct InventoryLevels {
    pub qty_on_hand: i64,
    pub qty_reserved: i64,
}

/// Outcome of a reservation attempt. Skips are normal paths, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOutcome {
    /// Quantity reserved against on-hand stock.
    Reserved,
    /// No SKU with that code exists; the line item carries no inventory impact.
    UnknownSku,
    /// Not enough available capacity; backorders are not tracked.
    InsufficientCapacity,
}

/// Namespace for inventory quantity transitions.
pub struct InventoryLedger;

impl InventoryLedger {
    /// Apply deltas to both counters, rejecting negative results.
    ///
    /// # Errors
    ///
    /// `NotFound` when the SKU or its inventory row is missing;
    /// `InvalidState` when either resulting quantity would be negative
    /// (the inventory row is left untouched).
    pub async fn adjust(
        conn: &mut PgConnection,
        sku_code: &str,
        delta_on_hand: i64,
        delta_reserved: i64,
    ) -> Result<InventoryLevels, RepositoryError> {
        let sku_id = find_sku_id(conn, sku_code)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let (qty_on_hand, qty_reserved) = lock_levels(conn, sku_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let new_on_hand = qty_on_hand + delta_on_hand;
        let new_reserved = qty_reserved + delta_reserved;
        if new_on_hand < 0 || new_reserved < 0 {
            return Err(RepositoryError::InvalidState(
                "Inventory cannot go negative".to_string(),
            ));
        }

        write_levels(conn, sku_id, new_on_hand, new_reserved).await?;
        Ok(InventoryLevels {
            qty_on_hand: new_on_hand,
            qty_reserved: new_reserved,
        })
    }

    /// Reserve `qty` units for an order, if the SKU exists and has capacity.
    ///
    /// Reserves only when `qty_on_hand - qty_reserved >= qty`; otherwise the
    /// reservation is skipped in full - no partial reservation, no error.
    ///
    /// # Errors
    ///
    /// Only on query failure; business mismatches are reported through the
    /// returned [`ReservationOutcome`].
    pub async fn reserve_for_order(
        conn: &mut PgConnection,
        sku_code: &str,
        qty: i64,
    ) -> Result<ReservationOutcome, RepositoryError> {
        let Some(sku_id) = find_sku_id(conn, sku_code).await? else {
            return Ok(ReservationOutcome::UnknownSku);
        };
        let Some((qty_on_hand, qty_reserved)) = lock_levels(conn, sku_id).await? else {
            return Ok(ReservationOutcome::UnknownSku);
        };

        if qty_on_hand - qty_reserved < qty {
            tracing::debug!(sku_code, qty, qty_on_hand, qty_reserved, "reservation skipped");
            return Ok(ReservationOutcome::InsufficientCapacity);
        }

        write_levels(conn, sku_id, qty_on_hand, qty_reserved + qty).await?;
        Ok(ReservationOutcome::Reserved)
    }

    /// Consume `qty` units on payment: decrement both counters, clamped at zero.
    ///
    /// Unknown SKUs are a no-op. The clamp means this never fails over
    /// inconsistent counters - payment events must not fail the webhook
    /// pipeline.
    ///
    /// # Errors
    ///
    /// Only on query failure.
    pub async fn release_on_payment(
        conn: &mut PgConnection,
        sku_code: &str,
        qty: i64,
    ) -> Result<(), RepositoryError> {
        let Some(sku_id) = find_sku_id(conn, sku_code).await? else {
            return Ok(());
        };
        let Some((qty_on_hand, qty_reserved)) = lock_levels(conn, sku_id).await? else {
            return Ok(());
        };

        write_levels(
            conn,
            sku_id,
            (qty_on_hand - qty).max(0),
            (qty_reserved - qty).max(0),
        )
        .await?;
        Ok(())
    }
}

async fn find_sku_id(
    conn: &mut PgConnection,
    sku_code: &str,
) -> Result<Option<SkuId>, RepositoryError> {
    let id = sqlx::query_scalar("SELECT id FROM skus WHERE sku_code = $1")
        .bind(sku_code)
        .fetch_optional(conn)
        .await?;
    Ok(id)
}

/// Read the inventory row under a `FOR UPDATE` lock.
async fn lock_levels(
    conn: &mut PgConnection,
    sku_id: SkuId,
) -> Result<Option<(i64, i64)>, RepositoryError> {
    let row = sqlx::query_as(
        "SELECT qty_on_hand, qty_reserved FROM inventory WHERE sku_id = $1 FOR UPDATE",
    )
    .bind(sku_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

async fn write_levels(
    conn: &mut PgConnection,
    sku_id: SkuId,
    qty_on_hand: i64,
    qty_reserved: i64,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE inventory SET qty_on_hand = $2, qty_reserved = $3, updated_at = now() \
         WHERE sku_id = $1",
    )
    .bind(sku_id)
    .bind(qty_on_hand)
    .bind(qty_reserved)
    .execute(conn)
    .await?;
    Ok(())
}

//! Database operations for products and SKUs.

use sqlx::PgPool;

use qbridge_core::{ProductId, SkuId};

use super::RepositoryError;

/// Input for creating a SKU (and, when needed, its parent product).
#[derive(Debug, Clone)]
pub struct CreateSkuInput {
    pub product_title: String,
    pub category: Option<String>,
    pub sku_code: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub price_cents: i64,
    pub cost_cents: i64,
    pub qty_on_hand: i64,
    pub reorder_level: i64,
}

/// A SKU together with its inventory counters, as returned to admin clients.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SkuSnapshot {
    pub sku_code: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub price_cents: i64,
    pub qty_on_hand: i64,
    pub qty_reserved: i64,
    pub reorder_level: i64,
}

/// Repository for catalog (product + SKU) operations.
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    /// Create a new repository backed by the given pool.
    #[must_use]
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }

    /// Create a SKU, reusing an existing product when one matches the title.
    ///
    /// Product title acts as a natural idempotency key: the lookup-then-insert
    /// runs inside one transaction together with the SKU and inventory
    /// inserts. The new SKU starts with `qty_reserved = 0` and requested
    /// quantities floored at zero.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the SKU code already exists, or `Database` on
    /// query failure.
    pub async fn create_sku(&self, input: CreateSkuInput) -> Result<SkuSnapshot, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_id: Option<ProductId> =
            sqlx::query_scalar("SELECT id FROM products WHERE title = $1")
                .bind(&input.product_title)
                .fetch_optional(&mut *tx)
                .await?;

        let product_id = match product_id {
            Some(id) => id,
            None => {
                sqlx::query_scalar("INSERT INTO products (title, category) VALUES ($1, $2) RETURNING id")
                    .bind(&input.product_title)
                    .bind(&input.category)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        let existing: Option<SkuId> = sqlx::query_scalar("SELECT id FROM skus WHERE sku_code = $1")
            .bind(&input.sku_code)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(RepositoryError::Conflict("SKU already exists".to_string()));
        }

        let sku_id: SkuId = sqlx::query_scalar(
            "INSERT INTO skus (product_id, sku_code, size, color, price_cents, cost_cents, active) \
             VALUES ($1, $2, $3, $4, $5, $6, TRUE) RETURNING id",
        )
        .bind(product_id)
        .bind(&input.sku_code)
        .bind(&input.size)
        .bind(&input.color)
        .bind(input.price_cents)
        .bind(input.cost_cents)
        .fetch_one(&mut *tx)
        .await?;

        let qty_on_hand = input.qty_on_hand.max(0);
        let reorder_level = input.reorder_level.max(0);
        sqlx::query(
            "INSERT INTO inventory (sku_id, qty_on_hand, qty_reserved, reorder_level) \
             VALUES ($1, $2, 0, $3)",
        )
        .bind(sku_id)
        .bind(qty_on_hand)
        .bind(reorder_level)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(SkuSnapshot {
            sku_code: input.sku_code,
            size: input.size,
            color: input.color,
            price_cents: input.price_cents,
            qty_on_hand,
            qty_reserved: 0,
            reorder_level,
        })
    }
}

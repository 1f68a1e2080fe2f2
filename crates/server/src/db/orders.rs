//! Database operations for orders, order items, customers, addresses, and
//! payments.
//!
//! Admin reads go through [`OrderRepository`] (pool-backed). The webhook
//! ingestion pipeline instead uses the transaction-scoped functions at the
//! bottom of this module, which take `&mut PgConnection` so one delivery's
//! writes commit atomically with the dedup ledger append.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use qbridge_core::{AddressId, CustomerId, OrderId, OrderStatus, PaymentStatus};

use super::RepositoryError;

// =============================================================================
// Records
// =============================================================================

/// Compact order row for list views.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    pub id: OrderId,
    pub shopify_order_id: Option<i64>,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Full order row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub shopify_order_id: Option<i64>,
    pub customer_id: Option<CustomerId>,
    pub shipping_address_id: Option<AddressId>,
    pub status: OrderStatus,
    pub currency: String,
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub placed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Denormalized line item as stored at order time.
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub sku_code: Option<String>,
    pub title: Option<String>,
    pub qty: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// Shipping destination for an order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShippingAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
}

/// An order together with its items.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Customer contact fields from an order-create payload.
#[derive(Debug, Clone, Default)]
pub struct CustomerFields {
    pub shopify_customer_id: Option<i64>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Address fields from an order-create payload.
#[derive(Debug, Clone)]
pub struct AddressFields {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
}

/// Fields for a new order row. Status always starts at `Imported`.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub shopify_order_id: i64,
    pub customer_id: CustomerId,
    pub shipping_address_id: AddressId,
    pub currency: String,
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub placed_at: Option<DateTime<Utc>>,
}

/// Fields for a new denormalized line item.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub sku_code: Option<String>,
    pub title: Option<String>,
    pub qty: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// Fields for a new payment record.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub provider: String,
    pub reference: String,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub paid_at: DateTime<Utc>,
}

// =============================================================================
// Admin reads
// =============================================================================

/// Pool-backed repository for admin order operations.
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    /// Create a new repository backed by the given pool.
    #[must_use]
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }

    /// List the newest 200 orders, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `Database` on query failure.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as(
                    "SELECT id, shopify_order_id, status, total_cents, created_at \
                     FROM orders WHERE status = $1 ORDER BY created_at DESC LIMIT 200",
                )
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, shopify_order_id, status, total_cents, created_at \
                     FROM orders ORDER BY created_at DESC LIMIT 200",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    /// Fetch an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no such order exists.
    pub async fn get_detail(&self, order_id: OrderId) -> Result<OrderDetail, RepositoryError> {
        let order: Order = sqlx::query_as(
            "SELECT id, shopify_order_id, customer_id, shipping_address_id, status, currency, \
                    subtotal_cents, shipping_cents, tax_cents, total_cents, placed_at, created_at \
             FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let items = sqlx::query_as(
            "SELECT sku_code, title, qty, unit_price_cents, line_total_cents \
             FROM order_items WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(OrderDetail { order, items })
    }

    /// Set an order's status.
    ///
    /// Any recognized status is accepted from any current status; the state
    /// machine's transition graph is deliberately unenforced here.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no such order exists.
    pub async fn set_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1")
            .bind(order_id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Fetch the shipping address linked to an order, if any.
    ///
    /// # Errors
    ///
    /// Returns `Database` on query failure.
    pub async fn shipping_address(
        &self,
        order_id: OrderId,
    ) -> Result<Option<ShippingAddress>, RepositoryError> {
        let address = sqlx::query_as(
            "SELECT a.line1, a.line2, a.city, a.province, a.postal_code, a.country \
             FROM addresses a JOIN orders o ON o.shipping_address_id = a.id \
             WHERE o.id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(address)
    }
}

// =============================================================================
// Transaction-scoped writes (webhook ingestion)
// =============================================================================

/// Look up an order by its external Shopify order id.
///
/// # Errors
///
/// Returns `Database` on query failure.
pub async fn find_by_shopify_order_id(
    conn: &mut PgConnection,
    shopify_order_id: i64,
) -> Result<Option<(OrderId, OrderStatus)>, RepositoryError> {
    let row = sqlx::query_as("SELECT id, status FROM orders WHERE shopify_order_id = $1")
        .bind(shopify_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Resolve a customer: match by external customer id when present, else
/// insert. Existing customer fields are never updated - first-seen data wins.
///
/// # Errors
///
/// Returns `Database` on query failure.
pub async fn upsert_customer(
    conn: &mut PgConnection,
    fields: &CustomerFields,
) -> Result<CustomerId, RepositoryError> {
    if let Some(external_id) = fields.shopify_customer_id {
        let existing: Option<CustomerId> =
            sqlx::query_scalar("SELECT id FROM customers WHERE shopify_customer_id = $1")
                .bind(external_id)
                .fetch_optional(&mut *conn)
                .await?;
        if let Some(id) = existing {
            return Ok(id);
        }
    }

    let id = sqlx::query_scalar(
        "INSERT INTO customers (shopify_customer_id, email, phone, first_name, last_name) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(fields.shopify_customer_id)
    .bind(&fields.email)
    .bind(&fields.phone)
    .bind(&fields.first_name)
    .bind(&fields.last_name)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Insert a fresh address row. Addresses are immutable and never reused.
///
/// # Errors
///
/// Returns `Database` on query failure.
pub async fn insert_address(
    conn: &mut PgConnection,
    customer_id: CustomerId,
    fields: &AddressFields,
) -> Result<AddressId, RepositoryError> {
    let id = sqlx::query_scalar(
        "INSERT INTO addresses (customer_id, line1, line2, city, province, postal_code, country) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
    )
    .bind(customer_id)
    .bind(&fields.line1)
    .bind(&fields.line2)
    .bind(&fields.city)
    .bind(&fields.province)
    .bind(&fields.postal_code)
    .bind(&fields.country)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Insert a new order in the `Imported` state.
///
/// # Errors
///
/// Returns `Database` on query failure.
pub async fn insert_order(
    conn: &mut PgConnection,
    order: &NewOrder,
) -> Result<OrderId, RepositoryError> {
    let id = sqlx::query_scalar(
        "INSERT INTO orders (shopify_order_id, customer_id, shipping_address_id, status, \
                             currency, subtotal_cents, shipping_cents, tax_cents, total_cents, \
                             placed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
    )
    .bind(order.shopify_order_id)
    .bind(order.customer_id)
    .bind(order.shipping_address_id)
    .bind(OrderStatus::Imported)
    .bind(&order.currency)
    .bind(order.subtotal_cents)
    .bind(order.shipping_cents)
    .bind(order.tax_cents)
    .bind(order.total_cents)
    .bind(order.placed_at)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Insert a denormalized line item for an order.
///
/// # Errors
///
/// Returns `Database` on query failure.
pub async fn insert_order_item(
    conn: &mut PgConnection,
    order_id: OrderId,
    item: &NewOrderItem,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO order_items (order_id, sku_code, title, qty, unit_price_cents, \
                                  line_total_cents) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(order_id)
    .bind(&item.sku_code)
    .bind(&item.title)
    .bind(item.qty)
    .bind(item.unit_price_cents)
    .bind(item.line_total_cents)
    .execute(conn)
    .await?;
    Ok(())
}

/// Fetch the items of an order inside the current transaction.
///
/// # Errors
///
/// Returns `Database` on query failure.
pub async fn items_for_order(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<OrderItem>, RepositoryError> {
    let items = sqlx::query_as(
        "SELECT sku_code, title, qty, unit_price_cents, line_total_cents \
         FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Transition an order's status inside the current transaction.
///
/// # Errors
///
/// Returns `Database` on query failure.
pub async fn update_status(
    conn: &mut PgConnection,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1")
        .bind(order_id)
        .bind(status)
        .execute(conn)
        .await?;
    Ok(())
}

/// Append a payment record for an order.
///
/// # Errors
///
/// Returns `Database` on query failure.
pub async fn insert_payment(
    conn: &mut PgConnection,
    payment: &NewPayment,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO payments (order_id, provider, reference, amount_cents, status, paid_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(payment.order_id)
    .bind(&payment.provider)
    .bind(&payment.reference)
    .bind(payment.amount_cents)
    .bind(payment.status)
    .bind(payment.paid_at)
    .execute(conn)
    .await?;
    Ok(())
}

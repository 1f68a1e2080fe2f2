//! Admin routes for SKUs and inventory adjustments.

use axum::{Json, Router, extract::State, routing::post};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::{CatalogRepository, InventoryLedger, catalog::CreateSkuInput, catalog::SkuSnapshot};
use crate::error::AppError;
use crate::middleware::RequireAdminKey;
use crate::state::AppState;

/// Build the SKU/inventory admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/skus", post(create_sku))
        .route("/admin/inventory/adjust", post(adjust_inventory))
}

#[derive(Debug, Deserialize)]
pub struct CreateSkuRequest {
    pub product_title: String,
    pub category: Option<String>,
    pub sku_code: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_cents: i64,
    #[serde(default)]
    pub qty_on_hand: i64,
    #[serde(default)]
    pub reorder_level: i64,
}

#[derive(Debug, Deserialize)]
pub struct InventoryAdjustRequest {
    pub sku_code: String,
    #[serde(default)]
    pub delta_on_hand: i64,
    #[serde(default)]
    pub delta_reserved: i64,
    /// Free-form audit note; accepted but not persisted in this core.
    pub reason: Option<String>,
}

/// POST /admin/skus - create a SKU (and its product when the title is new).
///
/// Responds 409 when the SKU code already exists.
async fn create_sku(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Json(req): Json<CreateSkuRequest>,
) -> Result<Json<SkuSnapshot>, AppError> {
    let repo = CatalogRepository::new(state.pool());
    let snapshot = repo
        .create_sku(CreateSkuInput {
            product_title: req.product_title,
            category: req.category,
            sku_code: req.sku_code,
            size: req.size,
            color: req.color,
            price_cents: req.price_cents,
            cost_cents: req.cost_cents,
            qty_on_hand: req.qty_on_hand,
            reorder_level: req.reorder_level,
        })
        .await?;
    tracing::info!(sku_code = %snapshot.sku_code, "SKU created");
    Ok(Json(snapshot))
}

/// POST /admin/inventory/adjust - apply deltas to a SKU's inventory counters.
///
/// This is the strict mutation path: 404 when the SKU or inventory row is
/// missing, 400 when either resulting quantity would be negative.
async fn adjust_inventory(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Json(req): Json<InventoryAdjustRequest>,
) -> Result<Json<Value>, AppError> {
    let mut tx = state.pool().begin().await?;
    let levels =
        InventoryLedger::adjust(&mut *tx, &req.sku_code, req.delta_on_hand, req.delta_reserved)
            .await?;
    tx.commit().await?;

    tracing::info!(
        sku_code = %req.sku_code,
        delta_on_hand = req.delta_on_hand,
        delta_reserved = req.delta_reserved,
        reason = req.reason.as_deref().unwrap_or(""),
        "inventory adjusted"
    );
    Ok(Json(json!({
        "ok": true,
        "sku_code": req.sku_code,
        "qty_on_hand": levels.qty_on_hand,
        "qty_reserved": levels.qty_reserved,
    })))
}

//! Admin routes for order management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

use qbridge_core::{OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::middleware::RequireAdminKey;
use crate::pdf::{self, ShipTo, SlipItem};
use crate::state::AppState;

/// Build the order admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/{order_id}", get(get_order))
        .route("/admin/orders/{order_id}/status", post(set_order_status))
        .route("/admin/orders/{order_id}/packing-slip.pdf", get(packing_slip))
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusParams {
    pub status: String,
}

fn parse_status(raw: &str) -> Result<OrderStatus, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid status".to_string()))
}

fn order_not_found(err: crate::db::RepositoryError) -> AppError {
    match err {
        crate::db::RepositoryError::NotFound => AppError::NotFound("Order not found".to_string()),
        other => other.into(),
    }
}

/// GET /admin/orders - newest 200 orders, optionally filtered by status.
async fn list_orders(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<Value>, AppError> {
    let status = params.status.as_deref().map(parse_status).transpose()?;
    let orders = OrderRepository::new(state.pool()).list(status).await?;
    Ok(Json(json!(orders)))
}

/// GET /admin/orders/{id} - order detail with items.
async fn get_order(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let detail = OrderRepository::new(state.pool())
        .get_detail(OrderId::new(order_id))
        .await
        .map_err(order_not_found)?;

    Ok(Json(json!({
        "id": detail.order.id,
        "shopify_order_id": detail.order.shopify_order_id,
        "status": detail.order.status,
        "total_cents": detail.order.total_cents,
        "placed_at": detail.order.placed_at,
        "created_at": detail.order.created_at,
        "items": detail.items,
    })))
}

/// POST /admin/orders/{id}/status?status=NAME - set an order's status.
///
/// Accepts any recognized status name from any current status; 400 on an
/// unknown name. No transition-legality check beyond that.
async fn set_order_status(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Query(params): Query<SetStatusParams>,
) -> Result<Json<Value>, AppError> {
    let status = parse_status(&params.status)?;
    OrderRepository::new(state.pool())
        .set_status(OrderId::new(order_id), status)
        .await
        .map_err(order_not_found)?;

    tracing::info!(order_id, status = %status, "order status set");
    Ok(Json(json!({
        "ok": true,
        "order_id": order_id,
        "status": status,
    })))
}

/// GET /admin/orders/{id}/packing-slip.pdf - render the packing slip.
async fn packing_slip(
    _admin: RequireAdminKey,
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Response, AppError> {
    let repo = OrderRepository::new(state.pool());
    let order_id = OrderId::new(order_id);
    let detail = repo.get_detail(order_id).await.map_err(order_not_found)?;
    let address = repo.shipping_address(order_id).await?;

    let ship_to = address.map_or_else(
        || ShipTo {
            country: "Canada".to_string(),
            ..ShipTo::default()
        },
        |addr| ShipTo {
            name: String::new(),
            line1: addr.line1,
            line2: addr.line2.unwrap_or_default(),
            city: addr.city,
            province: addr.province,
            postal_code: addr.postal_code,
            country: addr.country,
        },
    );
    let items: Vec<SlipItem> = detail
        .items
        .iter()
        .map(|item| SlipItem {
            qty: item.qty,
            sku_code: item.sku_code.clone().unwrap_or_default(),
            title: item.title.clone().unwrap_or_default(),
        })
        .collect();

    let bytes = pdf::build_packing_slip(order_id, &ship_to, &items);
    let disposition = format!("inline; filename=packing-slip-{order_id}.pdf");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

//! HTTP routes.
//!
//! - `/health` - unauthenticated liveness probe
//! - `/admin/*` - shared-secret admin API (SKUs, inventory, orders)
//! - `/webhooks/shopify/*` - HMAC-verified webhook ingestion

pub mod orders;
pub mod skus;
pub mod webhooks;

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(skus::router())
        .merge(orders::router())
        .merge(webhooks::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - liveness probe.
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "ok": true, "env": state.config().app_env }))
}

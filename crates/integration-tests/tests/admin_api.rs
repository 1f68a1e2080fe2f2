//! Integration tests for the admin API.
//!
//! These tests require:
//! - A running `PostgreSQL` database
//! - The server running (cargo run -p qbridge-server)
//! - `ADMIN_API_KEY` matching the server's env
//!
//! Run with: cargo test -p qbridge-integration-tests -- --ignored

use qbridge_integration_tests::{admin_key, base_url, client};
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

fn sku_request(sku_code: &str) -> Value {
    json!({
        "product_title": "Admin Test Shirt",
        "category": "shirts",
        "sku_code": sku_code,
        "size": "M",
        "color": "red",
        "price_cents": 1999,
        "qty_on_hand": 5
    })
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_health_needs_no_key() {
    let resp = client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to hit health");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json response");
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_missing_admin_key_rejected() {
    let resp = client()
        .get(format!("{}/admin/orders", base_url()))
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_wrong_admin_key_rejected() {
    let resp = client()
        .get(format!("{}/admin/orders", base_url()))
        .header("x-admin-key", "definitely-not-the-key")
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// SKUs & Inventory
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_sku_create_then_conflict() {
    let sku_code = format!("ADM-{}", Uuid::new_v4());

    let resp = client()
        .post(format!("{}/admin/skus", base_url()))
        .header("x-admin-key", admin_key())
        .json(&sku_request(&sku_code))
        .send()
        .await
        .expect("Failed to create SKU");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json response");
    assert_eq!(body["sku_code"], json!(sku_code));
    assert_eq!(body["qty_on_hand"], json!(5));

    let resp = client()
        .post(format!("{}/admin/skus", base_url()))
        .header("x-admin-key", admin_key())
        .json(&sku_request(&sku_code))
        .send()
        .await
        .expect("Failed to re-create SKU");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_inventory_adjust_applies_deltas() {
    let sku_code = format!("ADM-{}", Uuid::new_v4());
    client()
        .post(format!("{}/admin/skus", base_url()))
        .header("x-admin-key", admin_key())
        .json(&sku_request(&sku_code))
        .send()
        .await
        .expect("Failed to create SKU");

    let resp = client()
        .post(format!("{}/admin/inventory/adjust", base_url()))
        .header("x-admin-key", admin_key())
        .json(&json!({
            "sku_code": sku_code,
            "delta_on_hand": 3,
            "reason": "cycle count"
        }))
        .send()
        .await
        .expect("Failed to adjust");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json response");
    assert_eq!(body["qty_on_hand"], json!(8));
    assert_eq!(body["qty_reserved"], json!(0));
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_inventory_cannot_go_negative() {
    let sku_code = format!("ADM-{}", Uuid::new_v4());
    client()
        .post(format!("{}/admin/skus", base_url()))
        .header("x-admin-key", admin_key())
        .json(&sku_request(&sku_code))
        .send()
        .await
        .expect("Failed to create SKU");

    let resp = client()
        .post(format!("{}/admin/inventory/adjust", base_url()))
        .header("x-admin-key", admin_key())
        .json(&json!({ "sku_code": sku_code, "delta_on_hand": -100 }))
        .send()
        .await
        .expect("Failed to adjust");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_adjust_unknown_sku_is_404() {
    let resp = client()
        .post(format!("{}/admin/inventory/adjust", base_url()))
        .header("x-admin-key", admin_key())
        .json(&json!({ "sku_code": format!("NOPE-{}", Uuid::new_v4()), "delta_on_hand": 1 }))
        .send()
        .await
        .expect("Failed to adjust");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_order_list_rejects_bad_status() {
    let resp = client()
        .get(format!("{}/admin/orders?status=SHINY", base_url()))
        .header("x-admin-key", admin_key())
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_order_list_filters_by_status() {
    let resp = client()
        .get(format!("{}/admin/orders?status=PAID", base_url()))
        .header("x-admin-key", admin_key())
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json response");
    for order in body.as_array().expect("array response") {
        assert_eq!(order["status"], json!("PAID"));
    }
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_unknown_order_is_404() {
    let resp = client()
        .get(format!("{}/admin/orders/999999999", base_url()))
        .header("x-admin-key", admin_key())
        .send()
        .await
        .expect("Failed to fetch order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("json response");
    let message = body["error"].as_str().expect("error message");
    assert!(message.contains("Order not found"), "got: {message}");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_status_update_rejects_unknown_name() {
    let resp = client()
        .post(format!("{}/admin/orders/1/status?status=SHINY", base_url()))
        .header("x-admin-key", admin_key())
        .send()
        .await
        .expect("Failed to post status");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_packing_slip_is_pdf() {
    // Needs at least one imported order; list and take the newest.
    let resp = client()
        .get(format!("{}/admin/orders", base_url()))
        .header("x-admin-key", admin_key())
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::OK);
    let orders: Value = resp.json().await.expect("json response");
    let Some(order) = orders.as_array().and_then(|list| list.first()) else {
        return; // Empty database, nothing to render.
    };
    let order_id = order["id"].as_i64().expect("order id");

    let resp = client()
        .get(format!(
            "{}/admin/orders/{order_id}/packing-slip.pdf",
            base_url()
        ))
        .header("x-admin-key", admin_key())
        .send()
        .await
        .expect("Failed to fetch packing slip");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok()),
        Some("application/pdf")
    );
    let bytes = resp.bytes().await.expect("pdf bytes");
    assert!(bytes.starts_with(b"%PDF-"));
}

//! Envelope, identity and request-id behavior shared by every route.

#![allow(clippy::indexing_slicing)]

use axum::http::{Method, Request, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;

use stride_core::ProductId;
use stride_integration_tests::TestContext;

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let ctx = TestContext::new();
    let res = ctx.send(Method::GET, "/api/cart", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["status"], 401);
    assert_eq!(res.body["message"], "User ID not found in token");
    assert!(res.body["result"].is_null());
}

#[tokio::test]
async fn test_malformed_identity_is_unauthorized() {
    let ctx = TestContext::new();
    let request = Request::builder()
        .uri("/api/orders")
        .header("x-user-id", "not-a-uuid");
    let res = ctx.raw(request).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["message"], "Invalid User ID format");
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let ctx = TestContext::new();
    let stranger = stride_core::UserId::generate();
    let res = ctx.get("/api/cart/totals", stranger).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "User not found");
}

#[tokio::test]
async fn test_undecodable_body_is_bad_request() {
    let ctx = TestContext::new();
    let user = ctx.user().await;
    let res = ctx
        .post("/api/cart/items", user, json!({"id": "x", "region": "EU"}))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["status"], 400);
    assert_eq!(res.body["message"], "Invalid request body");
    assert!(res.body["result"].is_null());
}

#[tokio::test]
async fn test_invalid_size_region() {
    let ctx = TestContext::new();
    let user = ctx.user().await;
    let shoe = ctx.product("tempo", Decimal::from(100)).await;
    let res = ctx
        .post(
            "/api/cart/items",
            user,
            json!({"id": shoe.to_string(), "region": "JP", "size": 27}),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Invalid size and region");

    let res = ctx
        .post(
            "/api/cart/items",
            user,
            json!({"id": "abc", "region": "EU", "size": 40}),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Invalid product Id");
}

#[tokio::test]
async fn test_blank_address_field_is_rejected() {
    let ctx = TestContext::new();
    let user = ctx.user().await;
    let res = ctx
        .post(
            "/api/addresses",
            user,
            json!({"streetAddress": "1 MG Road", "city": "Bengaluru", "state": "KA"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Missing required fields: zipCode");
}

#[tokio::test]
async fn test_junk_pagination_uses_defaults() {
    let ctx = TestContext::new();
    let user = ctx.user().await;
    for n in 0..12 {
        let shoe = ctx.product(&format!("model-{n}"), Decimal::from(100)).await;
        ctx.add_to_cart(user, shoe).await;
    }

    let res = ctx.get("/api/cart?page=abc&limit=-3", user).await;
    assert_eq!(res.status, StatusCode::OK);
    let page = &res.body["result"];
    assert_eq!(page["currentPage"], 1);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["totalCartItems"], 12);
    assert_eq!(page["cartItems"].as_array().map(Vec::len), Some(10));

    let res = ctx.get("/api/cart?page=2&limit=10", user).await;
    assert_eq!(res.body["result"]["cartItems"].as_array().map(Vec::len), Some(2));

    let res = ctx.get("/api/cart?page=3&limit=10", user).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["result"]["status"], "no more items");
    assert_eq!(res.body["result"]["cartItems"], json!([]));
}

#[tokio::test]
async fn test_product_details() {
    let ctx = TestContext::new();
    let shoe = ctx.product("tempo", Decimal::new(129_999, 2)).await;

    let res = ctx
        .send(Method::GET, &format!("/api/products/{shoe}"), None, None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Product fetched successfully");
    let product = &res.body["result"]["product"];
    assert_eq!(product["productId"], shoe.to_string());
    assert_eq!(product["price"], "1299.99");

    let res = ctx
        .send(Method::GET, "/api/products/not-an-id", None, None)
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Invalid product ID format");

    let missing = ProductId::generate();
    let res = ctx
        .send(Method::GET, &format!("/api/products/{missing}"), None, None)
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["message"], "Product not found");
}

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new();
    let res = ctx.send(Method::GET, "/health", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = ctx.send(Method::GET, "/health/ready", None, None).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let ctx = TestContext::new();
    let res = ctx.send(Method::GET, "/health", None, None).await;
    let generated = res
        .headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(!generated.is_empty());

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "edge-7f3a");
    let res = ctx.raw(request).await;
    assert_eq!(
        res.headers.get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("edge-7f3a")
    );
}

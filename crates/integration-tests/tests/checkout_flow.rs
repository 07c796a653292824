//! Full shopper journey: cart, address book, checkout and payment.

#![allow(clippy::indexing_slicing)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;

use stride_integration_tests::{KEY_ID, TestContext, decimal, sign};

#[tokio::test]
async fn test_cart_to_paid_order() {
    let ctx = TestContext::new();
    let user = ctx.user().await;
    let shoe = ctx.product("tempo", Decimal::from(1000)).await;

    // EU 40 maps to L
    let res = ctx
        .post(
            "/api/cart/items",
            user,
            json!({"id": shoe.to_string(), "region": "EU", "size": 40}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Successfully added to cart");
    assert_eq!(res.body["result"]["cartCount"], 1);

    let res = ctx
        .post(
            "/api/cart/items/increment",
            user,
            json!({"id": shoe.to_string(), "size": "L"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["result"]["cartCount"], 1);

    let res = ctx.get("/api/cart", user).await;
    assert_eq!(res.status, StatusCode::OK);
    let page = &res.body["result"];
    assert_eq!(page["status"], "success");
    assert_eq!(page["totalCartItems"], 1);
    assert_eq!(page["cartItems"][0]["quantity"], 2);
    assert_eq!(page["cartItems"][0]["product"]["size"], "L");
    assert_eq!(page["cartItems"][0]["product"]["productId"], shoe.to_string());

    let res = ctx.get("/api/cart/totals", user).await;
    assert_eq!(res.status, StatusCode::OK);
    let totals = &res.body["result"];
    assert_eq!(decimal(&totals["totalPrice"]), Decimal::from(2000));
    assert_eq!(totals["platformFee"], "4.00");
    assert_eq!(totals["grandTotal"], "2004.00");

    let res = ctx
        .post(
            "/api/addresses",
            user,
            json!({
                "streetAddress": "12 Residency Road",
                "city": "Bengaluru",
                "state": "KA",
                "zipCode": "560025"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let address_id = res.body["result"]["addresses"][0]["id"]
        .as_str()
        .unwrap_or_default()
        .to_owned();

    let res = ctx
        .put(&format!("/api/addresses/{address_id}/select"), user, None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["result"]["addresses"][0]["isUserSelected"], true);

    let res = ctx.get("/api/addresses/selected", user).await;
    assert_eq!(res.body["result"]["addresses"][0]["id"], address_id.as_str());

    let res = ctx
        .post(
            "/api/orders",
            user,
            json!({"addressId": address_id, "amount": "2004.00"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Order created successfully");
    let session = &res.body["result"];
    assert_eq!(session["amount"], 200_400);
    assert_eq!(session["currency"], "INR");
    assert_eq!(session["key_id"], KEY_ID);
    let order_id = session["orderId"].as_str().unwrap_or_default().to_owned();
    let razorpay_id = session["razorpayId"].as_str().unwrap_or_default().to_owned();
    assert_eq!(razorpay_id, "order_test_1");
    assert_eq!(ctx.gateway.created(), 1);

    let res = ctx.get(&format!("/api/orders/{order_id}"), user).await;
    assert_eq!(res.body["result"]["order"]["status"], "pending");
    assert_eq!(res.body["result"]["order"]["paymentStatus"], "pending");

    let res = ctx
        .post(
            "/api/payments/verify",
            user,
            json!({
                "orderId": order_id,
                "razorpayId": razorpay_id,
                "paymentId": "pay_test_1",
                "signature": sign(&razorpay_id, "pay_test_1"),
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Payment verified successfully");
    assert_eq!(res.body["result"]["paymentId"], "pay_test_1");

    let res = ctx.get("/api/orders", user).await;
    assert_eq!(res.status, StatusCode::OK);
    let orders = &res.body["result"];
    assert_eq!(orders["totalOrders"], 1);
    assert_eq!(orders["orders"][0]["id"], order_id.as_str());
    assert_eq!(orders["orders"][0]["status"], "processing");

    let res = ctx.get("/api/cart", user).await;
    assert_eq!(res.body["result"]["totalCartItems"], 0);
    let product = ctx.store.product(shoe).await;
    assert!(product.is_some_and(|p| !p.in_cart));
}

#[tokio::test]
async fn test_checkout_with_empty_cart() {
    let ctx = TestContext::new();
    let user = ctx.user().await;
    let res = ctx
        .post(
            "/api/addresses",
            user,
            json!({
                "streetAddress": "4 Park Street",
                "city": "Kolkata",
                "state": "WB",
                "zipCode": "700016"
            }),
        )
        .await;
    let address_id = res.body["result"]["addresses"][0]["id"].clone();

    let res = ctx
        .post(
            "/api/orders",
            user,
            json!({"addressId": address_id, "amount": "10.00"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Cart is empty");
    assert_eq!(ctx.gateway.created(), 0);
}

#[tokio::test]
async fn test_forged_signature_keeps_order_pending() {
    let ctx = TestContext::new();
    let user = ctx.user().await;
    let shoe = ctx.product("glide", Decimal::from(500)).await;
    ctx.post(
        "/api/cart/items",
        user,
        json!({"id": shoe.to_string(), "region": "US", "size": 9}),
    )
    .await;
    let res = ctx
        .post(
            "/api/addresses",
            user,
            json!({
                "streetAddress": "7 Marine Drive",
                "city": "Mumbai",
                "state": "MH",
                "zipCode": "400020"
            }),
        )
        .await;
    let address_id = res.body["result"]["addresses"][0]["id"].clone();
    let res = ctx
        .post(
            "/api/orders",
            user,
            json!({"addressId": address_id, "amount": "501.00"}),
        )
        .await;
    let order_id = res.body["result"]["orderId"].clone();
    let razorpay_id = res.body["result"]["razorpayId"]
        .as_str()
        .unwrap_or_default()
        .to_owned();

    let res = ctx
        .post(
            "/api/payments/verify",
            user,
            json!({
                "orderId": order_id,
                "razorpayId": razorpay_id,
                "paymentId": "pay_test_2",
                "signature": sign(&razorpay_id, "pay_other"),
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["message"], "Invalid payment signature");

    let res = ctx.get("/api/orders?status=pending", user).await;
    assert_eq!(res.body["result"]["totalOrders"], 1);
    let res = ctx.get("/api/cart", user).await;
    assert_eq!(res.body["result"]["totalCartItems"], 1);
}

#[tokio::test]
async fn test_decrement_releases_catalog_flag() {
    let ctx = TestContext::new();
    let user = ctx.user().await;
    let shoe = ctx.product("pace", Decimal::from(750)).await;
    let body = json!({"id": shoe.to_string(), "region": "UK", "size": 6});
    ctx.post("/api/cart/items", user, body).await;
    assert!(ctx.store.product(shoe).await.is_some_and(|p| p.in_cart));

    let res = ctx
        .post(
            "/api/cart/items/decrement",
            user,
            json!({"id": shoe.to_string()}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Successfully removed 1 item from cart");
    assert_eq!(res.body["result"]["cartCount"], 0);
    assert!(ctx.store.product(shoe).await.is_some_and(|p| !p.in_cart));

    let res = ctx
        .post(
            "/api/cart/items/remove",
            user,
            json!({"id": shoe.to_string()}),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["result"]["cartCount"], 0);

    let res = ctx
        .post(
            "/api/cart/items/increment",
            user,
            json!({"id": shoe.to_string(), "size": "L"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(
        res.body["message"],
        "Product with specified size not found in cart"
    );
}

#[tokio::test]
async fn test_settled_order_rejects_another_payment() {
    let ctx = TestContext::new();
    let user = ctx.user().await;
    let shoe = ctx.product("swift", Decimal::from(300)).await;
    ctx.add_to_cart(user, shoe).await;
    let address_id = ctx.address(user, "3 Cubbon Road").await;

    let res = ctx
        .post(
            "/api/orders",
            user,
            json!({"addressId": address_id, "amount": "300.60"}),
        )
        .await;
    let order_id = res.body["result"]["orderId"]
        .as_str()
        .unwrap_or_default()
        .to_owned();
    let razorpay_id = res.body["result"]["razorpayId"]
        .as_str()
        .unwrap_or_default()
        .to_owned();

    let verify = |payment_id: &str| {
        json!({
            "orderId": order_id,
            "razorpayId": razorpay_id,
            "paymentId": payment_id,
            "signature": sign(&razorpay_id, payment_id),
        })
    };

    let res = ctx.post("/api/payments/verify", user, verify("pay_a")).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = ctx.post("/api/payments/verify", user, verify("pay_a")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["result"]["paymentId"], "pay_a");

    let res = ctx.post("/api/payments/verify", user, verify("pay_b")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.body["result"].is_null());

    let res = ctx.get(&format!("/api/orders/{order_id}"), user).await;
    assert_eq!(res.body["result"]["order"]["paymentId"], "pay_a");
    assert_eq!(res.body["result"]["order"]["status"], "processing");
}

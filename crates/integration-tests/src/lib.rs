//! End-to-end tests for the Stride storefront API.
//!
//! The tests drive the real router from `stride-storefront` with every store
//! backed by one [`MemoryStore`] and a fake payment gateway, so they need no
//! database or network.
//!
//! ```bash
//! cargo test -p stride-integration-tests
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, request::Builder},
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use stride_core::{Product, ProductId, UserId};
use stride_storefront::config::CommerceSettings;
use stride_storefront::db::{MemoryStore, Stores};
use stride_storefront::middleware::USER_ID_HEADER;
use stride_storefront::routes;
use stride_storefront::services::payments::payment_signature;
use stride_storefront::services::{
    PaymentProvider, PaymentProviderError, razorpay::RemoteOrder, razorpay::RemoteOrderRequest,
};
use stride_storefront::state::{AppState, Gateway};

/// Merchant secret the fake gateway "signs" payments with.
pub const KEY_SECRET: &str = "test_key_secret";
/// Public key id returned at checkout.
pub const KEY_ID: &str = "rzp_test_key";

/// Gateway that accepts every order and numbers them `order_test_<n>`.
#[derive(Default)]
pub struct FakeGateway {
    created: AtomicUsize,
}

impl FakeGateway {
    /// Number of remote orders created so far.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for FakeGateway {
    async fn create_order(
        &self,
        request: RemoteOrderRequest,
    ) -> Result<RemoteOrder, PaymentProviderError> {
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RemoteOrder {
            id: format!("order_test_{n}"),
            amount: request.amount,
            currency: request.currency,
        })
    }
}

/// A router over fresh in-memory state.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<FakeGateway>,
    router: Router,
}

/// Decoded response: status, headers and JSON body (`Value::Null` for
/// non-JSON bodies).
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(FakeGateway::default());
        let settings = CommerceSettings {
            operation_timeout: Duration::from_secs(2),
            ..CommerceSettings::default()
        };
        let state = AppState::with_stores(
            Stores::memory(store.clone()),
            Gateway {
                provider: gateway.clone(),
                key_id: KEY_ID.to_owned(),
                key_secret: SecretString::from(KEY_SECRET.to_owned()),
            },
            settings,
        );

        Self {
            store,
            gateway,
            router: routes::app(state),
        }
    }

    /// Register a fresh user.
    pub async fn user(&self) -> UserId {
        let user = UserId::generate();
        self.store.add_user(user).await;
        user
    }

    /// Put a product in the catalog.
    pub async fn product(&self, name: &str, price: Decimal) -> ProductId {
        let product = Product {
            id: ProductId::generate(),
            name: name.to_owned(),
            brand: "Stride".to_owned(),
            description: format!("{name} for everyday runs"),
            quantity: 25,
            price,
            category: "running".to_owned(),
            images: vec![format!("https://cdn.stride.test/{name}.jpg")],
            in_cart: false,
            cart_item_count: None,
            size: None,
        };
        let id = product.id;
        self.store.add_product(product).await;
        id
    }

    /// Add an address through the API and return its id.
    ///
    /// # Panics
    ///
    /// Panics if the address is not in the returned list.
    pub async fn address(&self, user: UserId, street: &str) -> String {
        let res = self
            .post(
                "/api/addresses",
                user,
                json!({
                    "streetAddress": street,
                    "city": "Bengaluru",
                    "state": "KA",
                    "zipCode": "560001"
                }),
            )
            .await;
        res.body["result"]["addresses"]
            .as_array()
            .and_then(|list| list.iter().find(|a| a["streetAddress"] == street))
            .and_then(|a| a["id"].as_str())
            .map(str::to_owned)
            .expect("address should be listed after adding it")
    }

    /// Put one unit of `product` (EU 40) in the user's cart.
    pub async fn add_to_cart(&self, user: UserId, product: ProductId) -> TestResponse {
        self.post(
            "/api/cart/items",
            user,
            json!({"id": product.to_string(), "region": "EU", "size": 40}),
        )
        .await
    }

    /// Send one request through the router.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<UserId>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        match body {
            Some(json) => {
                let builder = builder.header("content-type", "application/json");
                self.dispatch(builder, Body::from(json.to_string())).await
            }
            None => self.raw(builder).await,
        }
    }

    /// Send a hand-built request with an empty body.
    pub async fn raw(&self, builder: Builder) -> TestResponse {
        self.dispatch(builder, Body::empty()).await
    }

    /// Panics if the request cannot be built or the body cannot be read.
    async fn dispatch(&self, builder: Builder, body: Body) -> TestResponse {
        let request = builder.body(body).expect("request should build");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, user: UserId) -> TestResponse {
        self.send(Method::GET, uri, Some(user), None).await
    }

    pub async fn post(&self, uri: &str, user: UserId, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(user), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: UserId, body: Option<Value>) -> TestResponse {
        self.send(Method::PUT, uri, Some(user), body).await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Signature the gateway would hand the browser for a successful payment.
///
/// # Panics
///
/// Panics if the secret is rejected by the MAC.
#[must_use]
pub fn sign(razorpay_id: &str, payment_id: &str) -> String {
    payment_signature(KEY_SECRET.as_bytes(), razorpay_id, payment_id)
        .expect("HMAC accepts any key length")
}

/// Parse a decimal carried as a JSON string.
///
/// # Panics
///
/// Panics if `value` is not a decimal string.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("expected a decimal string")
}

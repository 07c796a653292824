//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness
//! GET    /health/ready                  - Readiness (store ping)
//!
//! # Products
//! GET    /api/products/{id}             - Product details
//!
//! # Cart
//! GET    /api/cart?page&limit           - Cart lines, paginated
//! GET    /api/cart/totals               - Subtotal, platform fee, grand total
//! POST   /api/cart/items                - Add {id, region, size}
//! POST   /api/cart/items/increment      - Add one more of a line {id, size}
//! POST   /api/cart/items/decrement      - Take one off a line {id}
//! POST   /api/cart/items/remove         - Drop a line {id}
//!
//! # Addresses
//! GET    /api/addresses                 - Address list
//! POST   /api/addresses                 - Add address
//! GET    /api/addresses/selected        - Selected address
//! PUT    /api/addresses/{id}            - Edit address
//! DELETE /api/addresses/{id}            - Delete address
//! PUT    /api/addresses/{id}/select     - Select address
//!
//! # Orders and payments
//! POST   /api/orders                    - Checkout
//! GET    /api/orders?page&limit&status  - Order history
//! GET    /api/orders/{id}               - One order
//! POST   /api/payments/verify           - Verify a gateway payment
//! ```
//!
//! Every `/api` route requires the `x-user-id` header except product details.
//! Responses use one envelope: `{status, message, result}`.

pub mod addresses;
pub mod cart;
pub mod orders;
pub mod payments;
pub mod products;

use std::str::FromStr;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{FromRequest, Request, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Page used when the query omits or garbles `page`.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when the query omits or garbles `limit`.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

// =============================================================================
// Envelope
// =============================================================================

/// Response envelope shared by every API route.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    pub result: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// `200 OK` with a result.
    pub fn ok(message: impl Into<String>, result: T) -> Response {
        let body = Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            result: Some(result),
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

impl ApiResponse<()> {
    /// Failure envelope; `result` is always `null`.
    #[must_use]
    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            result: None,
        }
    }
}

/// `{"status": "success", "cartCount": n}` result of cart mutations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCount {
    pub status: &'static str,
    pub cart_count: usize,
}

impl CartCount {
    #[must_use]
    pub const fn new(cart_count: usize) -> Self {
        Self {
            status: "success",
            cart_count,
        }
    }
}

// =============================================================================
// Extractors and parsing helpers
// =============================================================================

/// JSON body extractor whose rejection is an enveloped 400.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "rejected request body");
                Err(AppError::BadRequest("Invalid request body".to_owned()))
            }
        }
    }
}

/// `page`/`limit` query parameters.
///
/// Kept as raw strings so that junk values fall back to the defaults rather
/// than failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl Pagination {
    /// Resolved `(page, page_size)`; missing, unparsable or non-positive
    /// values use the defaults.
    #[must_use]
    pub fn resolve(&self) -> (u32, u32) {
        (
            positive_or(self.page.as_deref(), DEFAULT_PAGE),
            positive_or(self.limit.as_deref(), DEFAULT_PAGE_SIZE),
        )
    }
}

fn positive_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|&value| value > 0)
        .unwrap_or(default)
}

/// Parse a textual id, mapping failure to a 400 with `message`.
pub(crate) fn parse_id<T: FromStr>(raw: &str, message: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(message.to_owned()))
}

// =============================================================================
// Routers
// =============================================================================

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::list))
        .route("/totals", get(cart::totals))
        .route("/items", post(cart::add))
        .route("/items/increment", post(cart::increment))
        .route("/items/decrement", post(cart::decrement))
        .route("/items/remove", post(cart::remove))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::list).post(addresses::create))
        .route("/selected", get(addresses::selected))
        .route("/{id}", put(addresses::update).delete(addresses::delete))
        .route("/{id}/select", put(addresses::select))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route("/{id}", get(orders::show))
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products/{id}", get(products::show))
        .nest("/cart", cart_routes())
        .nest("/addresses", address_routes())
        .nest("/orders", order_routes())
        .route("/payments/verify", post(payments::verify))
}

/// The complete application router with health checks, tracing and
/// request ids. Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.health().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

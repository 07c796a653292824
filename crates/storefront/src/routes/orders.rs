//! Order route handlers: checkout and order history.

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use stride_core::{AddressId, Order, OrderId};

use super::{ApiJson, ApiResponse, Pagination, parse_id};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::orders::CheckoutRequest;
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub address_id: String,
    /// Amount to charge in major units.
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Optional status filter for the order history.
#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
struct OrderDetails {
    order: Order,
}

/// Create a pending order and its gateway order.
///
/// POST /api/orders
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    ApiJson(body): ApiJson<CreateOrderRequest>,
) -> Result<Response> {
    let address_id: AddressId = parse_id(&body.address_id, "Invalid address ID format")?;
    let session = state
        .orders()
        .create_order(
            user_id,
            CheckoutRequest {
                address_id,
                amount: body.amount,
                currency: body.currency,
            },
        )
        .await?;
    Ok(ApiResponse::ok("Order created successfully", session))
}

/// The caller's orders, newest first.
///
/// GET /api/orders?page&limit&status
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Query(pagination): Query<Pagination>,
    Query(filter): Query<StatusFilter>,
) -> Result<Response> {
    let (page, page_size) = pagination.resolve();
    let orders = state
        .orders()
        .list_orders(user_id, page, page_size, filter.status.as_deref())
        .await?;
    Ok(ApiResponse::ok("Orders fetched successfully", orders))
}

/// GET /api/orders/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Path(id): Path<String>,
) -> Result<Response> {
    let order_id: OrderId = parse_id(&id, "Invalid order ID format")?;
    let order = state.orders().get_order(user_id, order_id).await?;
    Ok(ApiResponse::ok("Order fetched successfully", OrderDetails { order }))
}

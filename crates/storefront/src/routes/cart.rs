//! Cart route handlers.
//!
//! The cart lives on the user record; every handler acts on the caller's own
//! cart and answers with the cart line count or the requested view.

use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use stride_core::{CartPage, ProductId};

use super::{ApiJson, ApiResponse, CartCount, Pagination, parse_id};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::state::AppState;

const INVALID_PRODUCT_ID: &str = "Invalid product Id";

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub id: String,
    /// Sizing system: `EU`, `US` or `UK`.
    pub region: String,
    /// Numeric size within the region.
    pub size: i32,
}

/// Increment request body; `size` is the stored size label.
#[derive(Debug, Deserialize)]
pub struct IncrementRequest {
    pub id: String,
    pub size: String,
}

/// Request body naming a product in the cart.
#[derive(Debug, Deserialize)]
pub struct ProductRef {
    pub id: String,
}

#[derive(Debug, Serialize)]
struct CartListing {
    status: &'static str,
    #[serde(flatten)]
    page: CartPage,
}

/// Add one unit of a product in a regional size.
///
/// POST /api/cart/items
#[instrument(skip(state, body))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<Response> {
    let product_id: ProductId = parse_id(&body.id, INVALID_PRODUCT_ID)?;
    let count = state
        .cart()
        .add_item(user_id, product_id, &body.region, body.size)
        .await?;
    Ok(ApiResponse::ok("Successfully added to cart", CartCount::new(count)))
}

/// Add one more unit to an existing line.
///
/// POST /api/cart/items/increment
#[instrument(skip(state, body))]
pub async fn increment(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    ApiJson(body): ApiJson<IncrementRequest>,
) -> Result<Response> {
    let product_id: ProductId = parse_id(&body.id, INVALID_PRODUCT_ID)?;
    let count = state
        .cart()
        .add_item_from_cart(user_id, product_id, &body.size)
        .await?;
    Ok(ApiResponse::ok("Successfully added to cart", CartCount::new(count)))
}

/// POST /api/cart/items/remove
#[instrument(skip(state, body))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    ApiJson(body): ApiJson<ProductRef>,
) -> Result<Response> {
    let product_id: ProductId = parse_id(&body.id, INVALID_PRODUCT_ID)?;
    let count = state.cart().remove_item(user_id, product_id).await?;
    Ok(ApiResponse::ok(
        "Successfully removed from cart",
        CartCount::new(count),
    ))
}

/// POST /api/cart/items/decrement
#[instrument(skip(state, body))]
pub async fn decrement(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    ApiJson(body): ApiJson<ProductRef>,
) -> Result<Response> {
    let product_id: ProductId = parse_id(&body.id, INVALID_PRODUCT_ID)?;
    let count = state.cart().decrement_item(user_id, product_id).await?;
    Ok(ApiResponse::ok(
        "Successfully removed 1 item from cart",
        CartCount::new(count),
    ))
}

/// Cart lines, one page at a time.
///
/// GET /api/cart?page&limit
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    Query(pagination): Query<Pagination>,
) -> Result<Response> {
    let (page, page_size) = pagination.resolve();
    let page = state.cart().list_items(user_id, page, page_size).await?;
    let status = if page.cart_items.is_empty() {
        "no more items"
    } else {
        "success"
    };
    Ok(ApiResponse::ok(
        "Successfully fetched cart items",
        CartListing { status, page },
    ))
}

/// GET /api/cart/totals
#[instrument(skip(state))]
pub async fn totals(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
) -> Result<Response> {
    let totals = state.cart().totals(user_id).await?;
    Ok(ApiResponse::ok("Successfully calculated cart totals", totals))
}

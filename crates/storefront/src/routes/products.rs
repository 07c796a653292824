//! Product detail route.

use axum::{
    extract::{Path, State},
    response::Response,
};
use serde::Serialize;
use tracing::instrument;

use stride_core::{Product, ProductId};

use super::{ApiResponse, parse_id};
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ProductDetails {
    status: &'static str,
    product: Product,
}

/// Product details.
///
/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let id: ProductId = parse_id(&id, "Invalid product ID format")?;
    let product = state.catalog().get_product(id).await?;

    Ok(ApiResponse::ok(
        "Product fetched successfully",
        ProductDetails {
            status: "success",
            product,
        },
    ))
}

//! Payment verification route.

use axum::{extract::State, response::Response};
use serde::Deserialize;
use tracing::instrument;

use stride_core::OrderId;

use super::{ApiJson, ApiResponse, parse_id};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::payments::PaymentConfirmation;
use crate::state::AppState;

/// Payment confirmation posted by the browser after checkout.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub razorpay_id: String,
}

/// Verify a gateway payment and mark the order paid.
///
/// POST /api/payments/verify
#[instrument(skip(state, body))]
pub async fn verify(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    ApiJson(body): ApiJson<VerifyPaymentRequest>,
) -> Result<Response> {
    let order_id: OrderId = parse_id(&body.order_id, "Invalid order ID format")?;
    let receipt = state
        .payments()
        .verify(
            user_id,
            PaymentConfirmation {
                order_id,
                razorpay_id: body.razorpay_id,
                payment_id: body.payment_id,
                signature: body.signature,
            },
        )
        .await?;
    Ok(ApiResponse::ok("Payment verified successfully", receipt))
}

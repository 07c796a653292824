//! Payment verification.
//!
//! After paying, the browser posts back the gateway order id, the payment id
//! and the gateway's signature. The signature is
//! `hex(HMAC-SHA256(key_secret, "{razorpay_id}|{payment_id}"))` and is the
//! only authenticity check; the gateway is not called back.

use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha256;
use tracing::instrument;

use stride_core::{OrderId, UserId};

use super::{CartLocks, CommerceError, best_effort, with_deadline};
use crate::config::CommerceSettings;
use crate::db::{CartStore, MarkPaid, OrderStore};

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded SHA-256 MAC.
const SIGNATURE_HEX_LEN: usize = 64;

/// Payment confirmation submitted by the client.
#[derive(Debug, Clone)]
pub struct PaymentConfirmation {
    pub order_id: OrderId,
    pub razorpay_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Identifiers of a verified payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub order_id: OrderId,
    pub payment_id: String,
    pub razorpay_id: String,
}

/// Compute the expected signature for a payment.
///
/// Returns `None` only if the key is rejected by the MAC.
#[must_use]
pub fn payment_signature(secret: &[u8], razorpay_id: &str, payment_id: &str) -> Option<String> {
    let mac = signing_mac(secret, razorpay_id, payment_id)?;
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Whether `submitted` is exactly the lowercase hex signature for the payment.
///
/// The MAC comparison is constant-time.
#[must_use]
pub fn signature_matches(
    secret: &[u8],
    razorpay_id: &str,
    payment_id: &str,
    submitted: &str,
) -> bool {
    let canonical = submitted.len() == SIGNATURE_HEX_LEN
        && submitted
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !canonical {
        return false;
    }

    let Ok(bytes) = hex::decode(submitted) else {
        return false;
    };
    let Some(mac) = signing_mac(secret, razorpay_id, payment_id) else {
        return false;
    };
    mac.verify_slice(&bytes).is_ok()
}

fn signing_mac(secret: &[u8], razorpay_id: &str, payment_id: &str) -> Option<HmacSha256> {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return None;
    };
    mac.update(razorpay_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Some(mac)
}

/// Verifies payment confirmations and records them on the order.
#[derive(Clone)]
pub struct PaymentVerifier {
    orders: Arc<dyn OrderStore>,
    carts: Arc<dyn CartStore>,
    locks: CartLocks,
    key_secret: SecretString,
    settings: CommerceSettings,
}

impl PaymentVerifier {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        carts: Arc<dyn CartStore>,
        locks: CartLocks,
        key_secret: SecretString,
        settings: CommerceSettings,
    ) -> Self {
        Self {
            orders,
            carts,
            locks,
            key_secret,
            settings,
        }
    }

    /// Verify a payment and move its order to `(processing, completed)`.
    ///
    /// On success the shopper's cart is cleared; a failure to clear is logged
    /// and does not fail the call. Verifying an already-paid order again
    /// succeeds without touching the order or the cart.
    ///
    /// # Errors
    ///
    /// - `SignatureMismatch` if the signature is wrong (the order is unchanged)
    /// - `OrderNotFound` if no pending order matches the id, owner and
    ///   gateway order id, or the order was settled by a different payment
    #[instrument(
        skip(self, confirmation),
        fields(
            user_id = %user_id,
            order_id = %confirmation.order_id,
            razorpay_id = %confirmation.razorpay_id,
        )
    )]
    pub async fn verify(
        &self,
        user_id: UserId,
        confirmation: PaymentConfirmation,
    ) -> Result<PaymentReceipt, CommerceError> {
        if !signature_matches(
            self.key_secret.expose_secret().as_bytes(),
            &confirmation.razorpay_id,
            &confirmation.payment_id,
            &confirmation.signature,
        ) {
            tracing::warn!("payment signature mismatch");
            return Err(CommerceError::SignatureMismatch);
        }

        let outcome = with_deadline(self.settings.operation_timeout, "verify_payment", async {
            Ok(self
                .orders
                .mark_paid(
                    user_id,
                    confirmation.order_id,
                    &confirmation.razorpay_id,
                    &confirmation.payment_id,
                    Utc::now(),
                )
                .await?)
        })
        .await?;

        match outcome {
            MarkPaid::Updated => {
                tracing::info!(payment_id = %confirmation.payment_id, "payment verified");
                self.clear_cart(user_id).await;
            }
            // Only a repeat of the payment that settled the order lands here
            MarkPaid::AlreadyCompleted => {
                tracing::info!(payment_id = %confirmation.payment_id, "payment already verified");
            }
            MarkPaid::NotFound => return Err(CommerceError::OrderNotFound),
        }

        Ok(PaymentReceipt {
            order_id: confirmation.order_id,
            payment_id: confirmation.payment_id,
            razorpay_id: confirmation.razorpay_id,
        })
    }

    async fn clear_cart(&self, user_id: UserId) {
        let _guard = self.locks.lock(user_id).await;
        best_effort(
            self.settings.operation_timeout,
            "clear_cart_after_payment",
            self.carts.clear_cart(user_id),
        )
        .await;
    }
}

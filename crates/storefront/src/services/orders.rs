//! Checkout and order history.
//!
//! Checkout turns the shopper's cart into a pending order:
//!
//! 1. the cart must have at least one line
//! 2. the address must belong to the shopper
//! 3. a remote order is created at the gateway (not retried)
//! 4. the order is stored with frozen copies of the cart lines
//!
//! The cart itself is left untouched until the payment is verified. Two
//! checkouts of the same cart create two orders; there is no dedup key.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use stride_core::{
    AddressId, CurrencyCode, NewOrder, Order, OrderId, OrderStatus, OrderSummary, UserId,
    to_minor_units, total_pages,
};

use super::razorpay::{PaymentProvider, RemoteOrderRequest};
use super::{CommerceError, with_deadline};
use crate::config::CommerceSettings;
use crate::db::{AddressStore, CartStore, OrderStore};

/// Checkout request.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub address_id: AddressId,
    /// Amount the client expects to pay, in major units.
    pub amount: Decimal,
    /// ISO currency code; the configured default when absent.
    pub currency: Option<String>,
}

/// What the client needs to open the gateway checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub order_id: OrderId,
    pub razorpay_id: String,
    /// Amount in minor units, as echoed by the gateway.
    pub amount: i64,
    pub currency: String,
    #[serde(rename = "key_id")]
    pub key_id: String,
}

/// One page of a shopper's orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<OrderSummary>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_orders: u64,
}

/// Order assembler and order queries.
#[derive(Clone)]
pub struct OrderService {
    carts: Arc<dyn CartStore>,
    addresses: Arc<dyn AddressStore>,
    orders: Arc<dyn OrderStore>,
    provider: Arc<dyn PaymentProvider>,
    key_id: String,
    settings: CommerceSettings,
}

impl OrderService {
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartStore>,
        addresses: Arc<dyn AddressStore>,
        orders: Arc<dyn OrderStore>,
        provider: Arc<dyn PaymentProvider>,
        key_id: String,
        settings: CommerceSettings,
    ) -> Self {
        Self {
            carts,
            addresses,
            orders,
            provider,
            key_id,
            settings,
        }
    }

    /// Create a pending order from the shopper's cart.
    ///
    /// Checks run in order: cart, address, then amount and currency.
    ///
    /// # Errors
    ///
    /// - `CartEmpty` if the cart has no lines (no order is stored)
    /// - `AddressNotOwned` if the address is missing or not the shopper's
    /// - `Validation` for a non-positive amount or unknown currency
    /// - `PaymentProvider` if the gateway call fails
    #[instrument(skip(self, request), fields(user_id = %user_id, address_id = %request.address_id))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, CommerceError> {
        with_deadline(self.settings.operation_timeout, "create_order", async {
            let cart = self
                .carts
                .load_cart(user_id)
                .await?
                .ok_or(CommerceError::UserNotFound)?;
            if cart.is_empty() {
                return Err(CommerceError::CartEmpty);
            }

            self.addresses
                .find_address(user_id, request.address_id)
                .await?
                .ok_or(CommerceError::AddressNotOwned)?;

            let amount_minor = to_minor_units(request.amount)
                .map_err(|e| CommerceError::validation(format!("Invalid amount: {e}")))?;
            let currency = match request.currency.as_deref().map(str::trim) {
                None | Some("") => self.settings.default_currency,
                Some(code) => code
                    .parse::<CurrencyCode>()
                    .map_err(|e| CommerceError::validation(format!("Invalid currency: {e}")))?,
            };

            let expected = cart.totals(self.settings.platform_fee_rate).grand_total;
            if expected.round_dp(2) != request.amount.round_dp(2) {
                tracing::warn!(
                    client_amount = %request.amount,
                    cart_total = %expected,
                    "checkout amount differs from cart total"
                );
            }

            let receipt = format!("receipt_{}", uuid::Uuid::new_v4().simple());
            let remote = self
                .provider
                .create_order(RemoteOrderRequest {
                    amount: amount_minor,
                    currency: currency.code().to_string(),
                    receipt,
                })
                .await?;

            let order = Order::pending(
                NewOrder {
                    user_id,
                    address_id: request.address_id,
                    total_amount: request.amount,
                    currency,
                    razorpay_id: remote.id.clone(),
                },
                &cart,
                Utc::now(),
            );
            self.orders.insert_order(&order).await?;

            tracing::info!(
                order_id = %order.id,
                razorpay_id = %remote.id,
                items = order.items.len(),
                "order created"
            );

            Ok(CheckoutSession {
                order_id: order.id,
                razorpay_id: remote.id,
                amount: remote.amount,
                currency: remote.currency,
                key_id: self.key_id.clone(),
            })
        })
        .await
    }

    /// A page of the shopper's orders, newest first.
    ///
    /// `status` must be one of the order status names when given.
    ///
    /// # Errors
    ///
    /// `Validation` for an unknown status, otherwise store errors.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_orders(
        &self,
        user_id: UserId,
        page: u32,
        page_size: u32,
        status: Option<&str>,
    ) -> Result<OrderPage, CommerceError> {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let status = status
            .filter(|s| !s.is_empty())
            .map(str::parse::<OrderStatus>)
            .transpose()
            .map_err(|e| CommerceError::validation(e.to_string()))?;

        with_deadline(self.settings.operation_timeout, "list_orders", async {
            let total_orders = self.orders.count_orders(user_id, status).await?;
            let offset = u64::from(page - 1) * u64::from(page_size);
            let orders = self
                .orders
                .list_orders(user_id, status, offset, page_size)
                .await?;

            Ok(OrderPage {
                orders: orders.iter().map(Order::summary).collect(),
                current_page: page,
                total_pages: total_pages(total_orders, page_size),
                total_orders,
            })
        })
        .await
    }

    /// A single order owned by the shopper.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` if absent or owned by someone else.
    #[instrument(skip(self), fields(user_id = %user_id, order_id = %order_id))]
    pub async fn get_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Order, CommerceError> {
        with_deadline(self.settings.operation_timeout, "get_order", async {
            self.orders
                .find_order(user_id, order_id)
                .await?
                .ok_or(CommerceError::OrderNotFound)
        })
        .await
    }
}

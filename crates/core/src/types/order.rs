//! Orders placed from a cart snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::{Cart, CartItem};
use super::id::{AddressId, OrderId, ProductId, UserId};
use super::price::CurrencyCode;
use super::product::Product;
use super::size::SizeCategory;
use super::status::{OrderStatus, PaymentStatus};

/// An item frozen into an order.
///
/// Owns its product copy; later cart or catalog changes do not reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product: Product,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeCategory>,
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product.id,
            product: item.product.clone(),
            quantity: item.quantity,
            size: item.product.size,
        }
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub address_id: AddressId,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Order reference issued by the payment gateway.
    pub razorpay_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to record a freshly checked-out order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub address_id: AddressId,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
    pub razorpay_id: String,
}

impl Order {
    /// Build a pending order from a cart snapshot.
    ///
    /// Items are deep copies of the cart lines.
    #[must_use]
    pub fn pending(new: NewOrder, cart: &Cart, now: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::generate(),
            user_id: new.user_id,
            address_id: new.address_id,
            items: cart.items().iter().map(OrderItem::from).collect(),
            total_amount: new.total_amount,
            currency: new.currency,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            razorpay_id: new.razorpay_id,
            payment_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a verified payment.
    pub fn mark_paid(&mut self, payment_id: &str, now: DateTime<Utc>) {
        self.status = OrderStatus::Processing;
        self.payment_status = PaymentStatus::Completed;
        self.payment_id = Some(payment_id.to_owned());
        self.updated_at = now;
    }

    /// Compact listing view of this order.
    #[must_use]
    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id,
            items: self
                .items
                .iter()
                .map(|item| OrderItemSummary {
                    name: item.product.name.clone(),
                    price: item.product.price,
                    size: item.size,
                    quantity: item.quantity,
                    image: item.product.primary_image().map(str::to_owned),
                })
                .collect(),
            status: self.status,
            total: self.total_amount,
            created_at: self.created_at,
        }
    }
}

/// One item line in an order listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItemSummary {
    pub name: String,
    pub price: Decimal,
    pub size: Option<SizeCategory>,
    pub quantity: u32,
    pub image: Option<String>,
}

/// Order listing projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub items: Vec<OrderItemSummary>,
    pub status: OrderStatus,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

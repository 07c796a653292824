//! Order queries.
//!
//! Orders are inserted once at checkout and afterwards only touched by
//! [`OrderStore::mark_paid`]. Nothing here deletes an order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

use stride_core::{
    AddressId, CurrencyCode, Order, OrderId, OrderItem, OrderStatus, PaymentStatus, UserId,
};

use super::{MarkPaid, OrderStore, PgStore, RepositoryError};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    address_id: Uuid,
    items: Json<Vec<OrderItem>>,
    total_amount: Decimal,
    currency: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    razorpay_id: String,
    payment_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let currency = row.currency.parse::<CurrencyCode>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            address_id: AddressId::new(row.address_id),
            items: row.items.0,
            total_amount: row.total_amount,
            currency,
            status: row.status,
            payment_status: row.payment_status,
            razorpay_id: row.razorpay_id,
            payment_id: row.payment_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, address_id, items, total_amount, currency, status, \
     payment_status, razorpay_id, payment_id, created_at, updated_at";

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.order
                (id, user_id, address_id, items, total_amount, currency, status,
                 payment_status, razorpay_id, payment_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.address_id)
        .bind(Json(&order.items))
        .bind(order.total_amount)
        .bind(order.currency.code())
        .bind(order.status)
        .bind(order.payment_status)
        .bind(&order.razorpay_id)
        .bind(order.payment_id.as_deref())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| super::conflict_or_database(e, "order"))?;
        Ok(())
    }

    async fn find_order(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn count_orders(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
    ) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM storefront.order
            WHERE user_id = $1 AND ($2::order_status IS NULL OR status = $2)
            ",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(self.pool())
        .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative order count {count}")))
    }

    async fn list_orders(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Order>, RepositoryError> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.order
             WHERE user_id = $1 AND ($2::order_status IS NULL OR status = $2)
             ORDER BY created_at DESC, id
             OFFSET $3 LIMIT $4"
        ))
        .bind(user_id)
        .bind(status)
        .bind(offset)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn mark_paid(
        &self,
        user_id: UserId,
        id: OrderId,
        razorpay_id: &str,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MarkPaid, RepositoryError> {
        let updated = sqlx::query(
            r"
            UPDATE storefront.order
            SET payment_status = 'completed',
                status = 'processing',
                payment_id = $4,
                updated_at = $5
            WHERE id = $1 AND user_id = $2 AND razorpay_id = $3
              AND payment_status = 'pending'
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(razorpay_id)
        .bind(payment_id)
        .bind(now)
        .execute(self.pool())
        .await?;

        if updated.rows_affected() > 0 {
            return Ok(MarkPaid::Updated);
        }

        let existing: Option<(PaymentStatus, Option<String>)> = sqlx::query_as(
            r"
            SELECT payment_status, payment_id FROM storefront.order
            WHERE id = $1 AND user_id = $2 AND razorpay_id = $3
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(razorpay_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(match existing {
            Some((PaymentStatus::Completed, Some(stored))) if stored == payment_id => {
                MarkPaid::AlreadyCompleted
            }
            Some((PaymentStatus::Completed, _)) => {
                tracing::warn!(order_id = %id, "order already settled by another payment");
                MarkPaid::NotFound
            }
            Some((status, _)) => {
                tracing::warn!(order_id = %id, %status, "payment verified for non-pending order");
                MarkPaid::NotFound
            }
            None => MarkPaid::NotFound,
        })
    }
}

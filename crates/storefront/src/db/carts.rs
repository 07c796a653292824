//! Cart persistence.
//!
//! The cart lives on the user row as a JSONB array of lines and is always
//! read and written whole. Callers serialize writers per user with
//! [`CartLocks`](crate::services::CartLocks).

use async_trait::async_trait;
use sqlx::types::Json;

use stride_core::{Cart, UserId};

use super::{CartStore, PgStore, RepositoryError};

#[async_trait]
impl CartStore for PgStore {
    async fn load_cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT cart FROM storefront.user WHERE id = $1")
                .bind(user_id)
                .fetch_optional(self.pool())
                .await?;

        row.map(|(cart,)| {
            serde_json::from_value::<Cart>(cart).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid cart for user {user_id}: {e}"))
            })
        })
        .transpose()
    }

    async fn save_cart(&self, user_id: UserId, cart: &Cart) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.user
            SET cart = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .bind(Json(cart))
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

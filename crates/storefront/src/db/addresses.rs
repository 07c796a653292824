//! Address book queries. Every statement is filtered by owning user.

use async_trait::async_trait;
use uuid::Uuid;

use stride_core::{Address, AddressFields, AddressId, UserId};

use super::{AddressStore, PgStore, RepositoryError};

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: Uuid,
    user_id: Uuid,
    street_address: String,
    city: String,
    state: String,
    zip_code: String,
    is_user_selected: bool,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            street_address: row.street_address,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            is_user_selected: row.is_user_selected,
        }
    }
}

const ADDRESS_COLUMNS: &str = "id, user_id, street_address, city, state, zip_code, is_user_selected";

#[async_trait]
impl AddressStore for PgStore {
    async fn insert_address(&self, address: &Address) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.address
                (id, user_id, street_address, city, state, zip_code, is_user_selected)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(address.id)
        .bind(address.user_id)
        .bind(&address.street_address)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(address.is_user_selected)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            super::conflict_or_database(e, "address")
        })?;
        Ok(())
    }

    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address
             WHERE user_id = $1
             ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    async fn find_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address
             WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Address::from))
    }

    async fn selected_address(&self, user_id: UserId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM storefront.address
             WHERE user_id = $1 AND is_user_selected
             LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Address::from))
    }

    async fn update_address(
        &self,
        user_id: UserId,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "UPDATE storefront.address
             SET street_address = $3, city = $4, state = $5, zip_code = $6
             WHERE id = $1 AND user_id = $2
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(&fields.street_address)
        .bind(&fields.city)
        .bind(&fields.state)
        .bind(&fields.zip_code)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Address::from))
    }

    async fn delete_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.address WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn select_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        // The EXISTS guard makes an unowned id a no-op instead of clearing
        // every selection.
        let result = sqlx::query(
            r"
            UPDATE storefront.address
            SET is_user_selected = (id = $1)
            WHERE user_id = $2
              AND EXISTS (
                  SELECT 1 FROM storefront.address owned
                  WHERE owned.id = $1 AND owned.user_id = $2
              )
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

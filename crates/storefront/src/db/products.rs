//! Catalog product queries.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use stride_core::{Product, ProductId};

use super::{CatalogStore, PgStore, RepositoryError};

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    brand: String,
    description: String,
    quantity: i32,
    price: Decimal,
    category: String,
    images: Vec<String>,
    in_cart: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            brand: row.brand,
            description: row.description,
            quantity: row.quantity,
            price: row.price,
            category: row.category,
            images: row.images,
            in_cart: row.in_cart,
            cart_item_count: None,
            size: None,
        }
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, brand, description, quantity, price, category, images, in_cart
            FROM storefront.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Product::from))
    }

    async fn set_in_cart(&self, id: ProductId, in_cart: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.product
            SET in_cart = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(in_cart)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

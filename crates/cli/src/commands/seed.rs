//! Seed a local database with users, products and addresses.
//!
//! The file is validated in full before anything is written, and every row
//! is upserted inside one transaction, so re-running a seed is safe.
//!
//! ```yaml
//! users:
//!   - id: 5f0c6f9e-2f4b-4c31-9d7a-0a4e2f6b1c11
//! products:
//!   - id: 0b7e8f34-6a51-4d0c-8f1f-3c0d9e2a7b55
//!     name: Trail Runner
//!     brand: Stride
//!     price: 4999.00
//!     category: shoes
//!     quantity: 40
//!     images: [https://cdn.example.com/trail-runner.jpg]
//! addresses:
//!   - id: 9a1d2c3b-4e5f-4a6b-8c7d-1e2f3a4b5c6d
//!     userId: 5f0c6f9e-2f4b-4c31-9d7a-0a4e2f6b1c11
//!     streetAddress: 12 MG Road
//!     city: Bengaluru
//!     state: KA
//!     zipCode: "560001"
//!     isUserSelected: true
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use tracing::{error, info};

use stride_core::{AddressId, ProductId, UserId};
use stride_storefront::db;

use super::database_url;

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub users: Vec<SeedUser>,
    pub products: Vec<SeedProduct>,
    pub addresses: Vec<SeedAddress>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: i32,
    pub price: Decimal,
    pub category: String,
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedAddress {
    pub id: AddressId,
    pub user_id: UserId,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub is_user_selected: bool,
}

/// Row counts written by a seed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub products: usize,
    pub addresses: usize,
}

/// Check a seed file against the schema's constraints.
///
/// Returns one message per problem; empty means the file is valid.
#[must_use]
pub fn validate(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    for product in &seed.products {
        if product.name.trim().is_empty() {
            errors.push(format!("product {}: name is blank", product.id));
        }
        if product.price <= Decimal::ZERO {
            errors.push(format!("product {}: price must be positive", product.id));
        }
        if product.quantity < 0 {
            errors.push(format!("product {}: quantity is negative", product.id));
        }
        if product.images.is_empty() {
            errors.push(format!("product {}: at least one image is required", product.id));
        }
    }

    let users: HashSet<UserId> = seed.users.iter().map(|u| u.id).collect();
    let mut selected: HashMap<UserId, usize> = HashMap::new();
    for address in &seed.addresses {
        if !users.contains(&address.user_id) {
            errors.push(format!(
                "address {}: user {} is not in the users list",
                address.id, address.user_id
            ));
        }
        let blank = [
            &address.street_address,
            &address.city,
            &address.state,
            &address.zip_code,
        ]
        .iter()
        .any(|field| field.trim().is_empty());
        if blank {
            errors.push(format!("address {}: required field is blank", address.id));
        }
        if address.is_user_selected {
            *selected.entry(address.user_id).or_default() += 1;
        }
    }
    for (user, count) in selected {
        if count > 1 {
            errors.push(format!("user {user}: {count} addresses marked selected"));
        }
    }

    errors
}

/// Read, validate and apply a seed file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or the database rejects a row.
pub async fn from_file(path: &Path) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    info!(path = %path.display(), "Loading seed file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    let mut tx = pool.begin().await?;
    let summary = apply(&mut tx, &seed).await?;
    tx.commit().await?;
    Ok(summary)
}

async fn apply(
    tx: &mut Transaction<'_, Postgres>,
    seed: &SeedFile,
) -> Result<SeedSummary, sqlx::Error> {
    for user in &seed.users {
        // Existing carts are left alone
        sqlx::query("INSERT INTO storefront.user (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(user.id)
            .execute(&mut **tx)
            .await?;
    }

    for product in &seed.products {
        sqlx::query(
            r"
            INSERT INTO storefront.product
                (id, name, brand, description, quantity, price, category, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                brand = EXCLUDED.brand,
                description = EXCLUDED.description,
                quantity = EXCLUDED.quantity,
                price = EXCLUDED.price,
                category = EXCLUDED.category,
                images = EXCLUDED.images,
                updated_at = NOW()
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(product.quantity)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.images)
        .execute(&mut **tx)
        .await?;
    }

    for address in &seed.addresses {
        sqlx::query(
            r"
            INSERT INTO storefront.address
                (id, user_id, street_address, city, state, zip_code, is_user_selected)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                street_address = EXCLUDED.street_address,
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                zip_code = EXCLUDED.zip_code,
                is_user_selected = EXCLUDED.is_user_selected
            ",
        )
        .bind(address.id)
        .bind(address.user_id)
        .bind(&address.street_address)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(address.is_user_selected)
        .execute(&mut **tx)
        .await?;
    }

    Ok(SeedSummary {
        users: seed.users.len(),
        products: seed.products.len(),
        addresses: seed.addresses.len(),
    })
}

//! Persistence for the storefront.
//!
//! # Database: `stride_storefront`
//!
//! ## Tables
//!
//! - `storefront.user` - Shoppers; each row carries its cart as JSONB
//! - `storefront.product` - Catalog products
//! - `storefront.address` - Shipping addresses
//! - `storefront.order` - Orders with frozen item snapshots (JSONB)
//!
//! Services talk to the store through the traits below so the same code runs
//! against `PostgreSQL` in production and [`MemoryStore`] in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p stride-cli -- migrate
//! ```

pub mod addresses;
pub mod carts;
pub mod memory;
pub mod orders;
pub mod products;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use stride_core::{
    Address, AddressFields, AddressId, Cart, Order, OrderId, OrderStatus, Product, ProductId,
    UserId,
};

pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate gateway order reference).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Store refused the operation (in-memory fault injection).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Store traits
// =============================================================================

/// Read access to catalog products.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look up a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Set the catalog-level `in_cart` flag on a product.
    async fn set_in_cart(&self, id: ProductId, in_cart: bool) -> Result<(), RepositoryError>;
}

/// Whole-cart load and save, keyed by user.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Load a user's cart; `None` if the user does not exist.
    async fn load_cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Replace a user's cart.
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    async fn save_cart(&self, user_id: UserId, cart: &Cart) -> Result<(), RepositoryError>;

    /// Empty a user's cart.
    async fn clear_cart(&self, user_id: UserId) -> Result<(), RepositoryError> {
        self.save_cart(user_id, &Cart::default()).await
    }
}

/// Ownership-filtered address book operations.
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn insert_address(&self, address: &Address) -> Result<(), RepositoryError>;

    /// All of a user's addresses, oldest first.
    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError>;

    async fn find_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError>;

    async fn selected_address(&self, user_id: UserId) -> Result<Option<Address>, RepositoryError>;

    /// Overwrite the editable fields; `None` if the address is not the user's.
    async fn update_address(
        &self,
        user_id: UserId,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<Option<Address>, RepositoryError>;

    /// Returns `false` if nothing owned by the user matched.
    async fn delete_address(&self, user_id: UserId, id: AddressId) -> Result<bool, RepositoryError>;

    /// Make `id` the user's only selected address in one atomic step.
    ///
    /// Returns `false` (and changes nothing) if the address is not the user's.
    async fn select_address(&self, user_id: UserId, id: AddressId) -> Result<bool, RepositoryError>;
}

/// Outcome of recording a verified payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkPaid {
    /// The order moved from pending to paid.
    Updated,
    /// The order was already paid with this payment id; nothing changed.
    AlreadyCompleted,
    /// No pending order matched the id, owner and gateway reference, or the
    /// order was settled by a different payment id.
    NotFound,
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn find_order(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Count a user's orders, optionally filtered by status.
    async fn count_orders(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
    ) -> Result<u64, RepositoryError>;

    /// A page of a user's orders, newest first.
    async fn list_orders(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// Atomically apply a verified payment to a pending order.
    ///
    /// Matches on `(id, user_id, razorpay_id)` and sets status `processing`,
    /// payment status `completed`, the payment id and `updated_at`.
    async fn mark_paid(
        &self,
        user_id: UserId,
        id: OrderId,
        razorpay_id: &str,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MarkPaid, RepositoryError>;
}

/// Connectivity probe for readiness checks.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepositoryError>;
}

// =============================================================================
// PostgreSQL store
// =============================================================================

/// `PostgreSQL` implementation of every store trait.
///
/// Trait impls live in the sibling modules, one per table.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a unique-violation into `RepositoryError::Conflict`.
pub(crate) fn conflict_or_database(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

// =============================================================================
// Store bundle
// =============================================================================

/// Store handles injected into the services, built once at startup.
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn CatalogStore>,
    pub carts: Arc<dyn CartStore>,
    pub addresses: Arc<dyn AddressStore>,
    pub orders: Arc<dyn OrderStore>,
    pub health: Arc<dyn StoreHealth>,
}

impl Stores {
    /// Every store backed by the same `PostgreSQL` pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_shared(Arc::new(PgStore::new(pool)))
    }

    /// Every store backed by one in-memory instance.
    #[must_use]
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self::from_shared(store)
    }

    fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: CatalogStore + CartStore + AddressStore + OrderStore + StoreHealth + 'static,
    {
        Self {
            catalog: store.clone(),
            carts: store.clone(),
            addresses: store.clone(),
            orders: store.clone(),
            health: store,
        }
    }
}

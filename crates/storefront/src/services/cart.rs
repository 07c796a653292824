//! Cart operations.
//!
//! Each mutation takes the user's [`CartLocks`] entry, loads the whole cart,
//! applies the change through [`Cart`] and saves it back.

use std::sync::Arc;

use tracing::instrument;

use stride_core::{
    Cart, CartPage, CartTotals, Decrement, ProductId, SizeCategory, SizeRegion, UserId,
    resolve_size,
};

use super::{CartLocks, CommerceError, best_effort, with_deadline};
use crate::config::CommerceSettings;
use crate::db::{CartStore, CatalogStore, RepositoryError};

/// Per-user cart engine.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
    locks: CartLocks,
    settings: CommerceSettings,
}

impl CartService {
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartStore>,
        catalog: Arc<dyn CatalogStore>,
        locks: CartLocks,
        settings: CommerceSettings,
    ) -> Self {
        Self {
            carts,
            catalog,
            locks,
            settings,
        }
    }

    /// Add one unit of a product in a regional size.
    ///
    /// Returns the number of cart lines afterwards.
    ///
    /// # Errors
    ///
    /// `InvalidSizeRegion` if `(region, size_code)` is not in the size table,
    /// `ProductNotFound` if the product does not exist.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        region: &str,
        size_code: i32,
    ) -> Result<usize, CommerceError> {
        let size = region
            .parse::<SizeRegion>()
            .and_then(|region| resolve_size(region, size_code))
            .map_err(|_| CommerceError::InvalidSizeRegion)?;

        with_deadline(self.settings.operation_timeout, "add_item", async {
            let product = self
                .catalog
                .get_product(product_id)
                .await?
                .ok_or(CommerceError::ProductNotFound)?;

            let _guard = self.locks.lock(user_id).await;
            let mut cart = self.load(user_id).await?;
            cart.add(&product, size);
            self.save(user_id, &cart).await?;

            tracing::debug!(%size, lines = cart.line_count(), "item added to cart");
            Ok(cart.line_count())
        })
        .await
    }

    /// Increment an existing line by its stored size label.
    ///
    /// Never inserts a new line.
    ///
    /// # Errors
    ///
    /// `ItemNotInCart` if no line matches `(product_id, size)`.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_item_from_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: &str,
    ) -> Result<usize, CommerceError> {
        // A label outside the known buckets can never match a stored line
        let size = size
            .parse::<SizeCategory>()
            .map_err(|_| CommerceError::ItemNotInCart)?;

        with_deadline(self.settings.operation_timeout, "add_item_from_cart", async {
            let _guard = self.locks.lock(user_id).await;
            let mut cart = self.load(user_id).await?;
            if !cart.increment(product_id, size) {
                return Err(CommerceError::ItemNotInCart);
            }
            self.save(user_id, &cart).await?;
            Ok(cart.line_count())
        })
        .await
    }

    /// Remove the first line for a product, whatever its size.
    ///
    /// Absent products are a no-op. The catalog `in_cart` flag is cleared
    /// only when no other line (another size of the same product) remains,
    /// the same rule decrement follows. Returns the number of cart lines.
    ///
    /// # Errors
    ///
    /// `UserNotFound` or a store error.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<usize, CommerceError> {
        let (count, released) =
            with_deadline(self.settings.operation_timeout, "remove_item", async {
                let _guard = self.locks.lock(user_id).await;
                let mut cart = self.load(user_id).await?;
                let removed = cart.remove(product_id).is_some();
                if removed {
                    self.save(user_id, &cart).await?;
                }
                Ok((cart.line_count(), removed && !cart.contains_product(product_id)))
            })
            .await?;

        if released {
            self.release_catalog_flag(product_id).await;
        }
        Ok(count)
    }

    /// Take one unit off the first line for a product.
    ///
    /// A line at quantity one is removed. Returns the number of cart lines.
    ///
    /// # Errors
    ///
    /// `UserNotFound` or a store error.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn decrement_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<usize, CommerceError> {
        let (count, released) =
            with_deadline(self.settings.operation_timeout, "decrement_item", async {
                let _guard = self.locks.lock(user_id).await;
                let mut cart = self.load(user_id).await?;
                let outcome = cart.decrement(product_id);
                if outcome != Decrement::Absent {
                    self.save(user_id, &cart).await?;
                }
                let released =
                    outcome == Decrement::Removed && !cart.contains_product(product_id);
                Ok((cart.line_count(), released))
            })
            .await?;

        if released {
            self.release_catalog_flag(product_id).await;
        }
        Ok(count)
    }

    /// One page of cart lines, each annotated with its quantity.
    ///
    /// # Errors
    ///
    /// `UserNotFound` or a store error.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_items(
        &self,
        user_id: UserId,
        page: u32,
        page_size: u32,
    ) -> Result<CartPage, CommerceError> {
        with_deadline(self.settings.operation_timeout, "list_items", async {
            let cart = self.load(user_id).await?;
            Ok(cart.page(page, page_size))
        })
        .await
    }

    /// Subtotal, platform fee and grand total.
    ///
    /// # Errors
    ///
    /// `UserNotFound` or a store error.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn totals(&self, user_id: UserId) -> Result<CartTotals, CommerceError> {
        with_deadline(self.settings.operation_timeout, "cart_totals", async {
            let cart = self.load(user_id).await?;
            Ok(cart.totals(self.settings.platform_fee_rate))
        })
        .await
    }

    async fn load(&self, user_id: UserId) -> Result<Cart, CommerceError> {
        self.carts
            .load_cart(user_id)
            .await?
            .ok_or(CommerceError::UserNotFound)
    }

    async fn save(&self, user_id: UserId, cart: &Cart) -> Result<(), CommerceError> {
        self.carts
            .save_cart(user_id, cart)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CommerceError::UserNotFound,
                other => CommerceError::Store(other),
            })
    }

    async fn release_catalog_flag(&self, product_id: ProductId) {
        best_effort(
            self.settings.operation_timeout,
            "clear_catalog_in_cart",
            self.catalog.set_in_cart(product_id, false),
        )
        .await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::testing::{product, settings};

    struct Fixture {
        store: Arc<MemoryStore>,
        service: CartService,
        user: UserId,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let user = UserId::generate();
        store.add_user(user).await;
        let service = CartService::new(store.clone(), store.clone(), CartLocks::new(), settings());
        Fixture {
            store,
            service,
            user,
        }
    }

    #[tokio::test]
    async fn test_add_item_resolves_regional_size() {
        let f = fixture().await;
        let shoe = product("runner", Decimal::from(100));
        f.store.add_product(shoe.clone()).await;

        let count = f.service.add_item(f.user, shoe.id, "EU", 39).await.unwrap();
        assert_eq!(count, 1);

        let cart = f.store.cart(f.user).await.unwrap();
        assert_eq!(cart.items()[0].product.size, Some(SizeCategory::M));
        assert!(cart.items()[0].product.in_cart);
    }

    #[tokio::test]
    async fn test_add_item_twice_increments() {
        let f = fixture().await;
        let shoe = product("runner", Decimal::from(100));
        f.store.add_product(shoe.clone()).await;

        f.service.add_item(f.user, shoe.id, "UK", 5).await.unwrap();
        // US 6 resolves to the same bucket as UK 5
        let count = f.service.add_item(f.user, shoe.id, "US", 6).await.unwrap();

        assert_eq!(count, 1);
        let cart = f.store.cart(f.user).await.unwrap();
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_add_item_rejects_unknown_size_before_lookup() {
        let f = fixture().await;
        let missing = ProductId::generate();

        let err = f.service.add_item(f.user, missing, "EU", 99).await.unwrap_err();
        assert!(matches!(err, CommerceError::InvalidSizeRegion));

        let err = f.service.add_item(f.user, missing, "FR", 39).await.unwrap_err();
        assert!(matches!(err, CommerceError::InvalidSizeRegion));

        let err = f.service.add_item(f.user, missing, "EU", 39).await.unwrap_err();
        assert!(matches!(err, CommerceError::ProductNotFound));
    }

    #[tokio::test]
    async fn test_add_item_from_cart_never_inserts() {
        let f = fixture().await;
        let shoe = product("runner", Decimal::from(100));
        f.store.add_product(shoe.clone()).await;

        let err = f
            .service
            .add_item_from_cart(f.user, shoe.id, "M")
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::ItemNotInCart));

        f.service.add_item(f.user, shoe.id, "EU", 39).await.unwrap();
        f.service.add_item_from_cart(f.user, shoe.id, "M").await.unwrap();
        let err = f
            .service
            .add_item_from_cart(f.user, shoe.id, "XL")
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::ItemNotInCart));

        let cart = f.store.cart(f.user).await.unwrap();
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_decrement_to_zero_clears_catalog_flag() {
        let f = fixture().await;
        let mut shoe = product("runner", Decimal::from(100));
        shoe.in_cart = true;
        f.store.add_product(shoe.clone()).await;

        f.service.add_item(f.user, shoe.id, "EU", 40).await.unwrap();
        let count = f.service.decrement_item(f.user, shoe.id).await.unwrap();

        assert_eq!(count, 0);
        assert!(f.store.cart(f.user).await.unwrap().is_empty());
        assert!(!f.store.product(shoe.id).await.unwrap().in_cart);
    }

    #[tokio::test]
    async fn test_remove_succeeds_when_flag_update_fails() {
        let f = fixture().await;
        let shoe = product("runner", Decimal::from(100));
        f.store.add_product(shoe.clone()).await;
        f.service.add_item(f.user, shoe.id, "EU", 40).await.unwrap();

        f.store.fail_catalog_writes(true);
        let count = f.service.remove_item(f.user, shoe.id).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_remove_keeps_flag_while_another_size_remains() {
        let f = fixture().await;
        let mut shoe = product("runner", Decimal::from(100));
        shoe.in_cart = true;
        f.store.add_product(shoe.clone()).await;
        f.service.add_item(f.user, shoe.id, "EU", 39).await.unwrap();
        f.service.add_item(f.user, shoe.id, "EU", 42).await.unwrap();

        let count = f.service.remove_item(f.user, shoe.id).await.unwrap();
        assert_eq!(count, 1);
        assert!(f.store.product(shoe.id).await.unwrap().in_cart);

        let count = f.service.remove_item(f.user, shoe.id).await.unwrap();
        assert_eq!(count, 0);
        assert!(!f.store.product(shoe.id).await.unwrap().in_cart);
    }

    #[tokio::test]
    async fn test_remove_absent_product_is_noop() {
        let f = fixture().await;
        let count = f
            .service
            .remove_item(f.user, ProductId::generate())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_totals_apply_fee_rate() {
        let f = fixture().await;
        let shoe = product("runner", Decimal::new(10000, 2));
        f.store.add_product(shoe.clone()).await;
        f.service.add_item(f.user, shoe.id, "EU", 39).await.unwrap();
        f.service.add_item(f.user, shoe.id, "EU", 39).await.unwrap();

        let totals = f.service.totals(f.user).await.unwrap();
        assert_eq!(totals.subtotal, Decimal::new(20000, 2));
        assert_eq!(totals.fee, Decimal::new(40, 2));
        assert_eq!(totals.grand_total, Decimal::new(20040, 2));
    }

    #[tokio::test]
    async fn test_unknown_user_is_reported() {
        let f = fixture().await;
        let err = f
            .service
            .list_items(UserId::generate(), 1, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::UserNotFound));
    }

    #[tokio::test]
    async fn test_concurrent_adds_do_not_lose_updates() {
        let f = fixture().await;
        let shoe = product("runner", Decimal::from(100));
        f.store.add_product(shoe.clone()).await;

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let service = f.service.clone();
                let user = f.user;
                let id = shoe.id;
                tokio::spawn(async move { service.add_item(user, id, "EU", 39).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let cart = f.store.cart(f.user).await.unwrap();
        assert_eq!(cart.items()[0].quantity, 20);
    }
}

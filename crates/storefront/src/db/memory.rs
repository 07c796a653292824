//! In-memory store used by tests and local experiments.
//!
//! Implements every store trait over plain collections behind one async
//! mutex, so each trait call is atomic just like a single SQL statement.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use stride_core::{
    Address, AddressFields, AddressId, Cart, Order, OrderId, OrderStatus, PaymentStatus, Product,
    ProductId, UserId,
};

use super::{
    AddressStore, CartStore, CatalogStore, MarkPaid, OrderStore, RepositoryError, StoreHealth,
};

#[derive(Default)]
struct MemoryState {
    carts: HashMap<UserId, Cart>,
    products: HashMap<ProductId, Product>,
    addresses: Vec<Address>,
    orders: Vec<Order>,
}

/// Store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    fail_cart_writes: AtomicBool,
    fail_catalog_writes: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with an empty cart.
    pub async fn add_user(&self, user_id: UserId) {
        self.state.lock().await.carts.entry(user_id).or_default();
    }

    pub async fn add_product(&self, product: Product) {
        self.state.lock().await.products.insert(product.id, product);
    }

    pub async fn add_address(&self, address: Address) {
        self.state.lock().await.addresses.push(address);
    }

    /// Current catalog record for a product.
    pub async fn product(&self, id: ProductId) -> Option<Product> {
        self.state.lock().await.products.get(&id).cloned()
    }

    /// Current cart for a user.
    pub async fn cart(&self, user_id: UserId) -> Option<Cart> {
        self.state.lock().await.carts.get(&user_id).cloned()
    }

    /// Every stored order, regardless of owner.
    pub async fn all_orders(&self) -> Vec<Order> {
        self.state.lock().await.orders.clone()
    }

    /// Make cart saves fail with `RepositoryError::Unavailable`.
    pub fn fail_cart_writes(&self, fail: bool) {
        self.fail_cart_writes.store(fail, Ordering::SeqCst);
    }

    /// Make catalog flag updates fail with `RepositoryError::Unavailable`.
    pub fn fail_catalog_writes(&self, fail: bool) {
        self.fail_catalog_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.state.lock().await.products.get(&id).cloned())
    }

    async fn set_in_cart(&self, id: ProductId, in_cart: bool) -> Result<(), RepositoryError> {
        if self.fail_catalog_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("catalog writes disabled".to_owned()));
        }
        let mut state = self.state.lock().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        product.in_cart = in_cart;
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn load_cart(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.state.lock().await.carts.get(&user_id).cloned())
    }

    async fn save_cart(&self, user_id: UserId, cart: &Cart) -> Result<(), RepositoryError> {
        if self.fail_cart_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("cart writes disabled".to_owned()));
        }
        let mut state = self.state.lock().await;
        let stored = state
            .carts
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;
        stored.clone_from(cart);
        Ok(())
    }
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn insert_address(&self, address: &Address) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if !state.carts.contains_key(&address.user_id) {
            return Err(RepositoryError::NotFound);
        }
        if state.addresses.iter().any(|a| a.id == address.id) {
            return Err(RepositoryError::Conflict("address already exists".to_owned()));
        }
        state.addresses.push(address.clone());
        Ok(())
    }

    async fn list_addresses(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .addresses
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .addresses
            .iter()
            .find(|a| a.id == id && a.user_id == user_id)
            .cloned())
    }

    async fn selected_address(&self, user_id: UserId) -> Result<Option<Address>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .addresses
            .iter()
            .find(|a| a.user_id == user_id && a.is_user_selected)
            .cloned())
    }

    async fn update_address(
        &self,
        user_id: UserId,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<Option<Address>, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(address) = state
            .addresses
            .iter_mut()
            .find(|a| a.id == id && a.user_id == user_id)
        else {
            return Ok(None);
        };

        address.street_address.clone_from(&fields.street_address);
        address.city.clone_from(&fields.city);
        address.state.clone_from(&fields.state);
        address.zip_code.clone_from(&fields.zip_code);
        Ok(Some(address.clone()))
    }

    async fn delete_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        let before = state.addresses.len();
        state
            .addresses
            .retain(|a| !(a.id == id && a.user_id == user_id));
        Ok(state.addresses.len() < before)
    }

    async fn select_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        let owned = state
            .addresses
            .iter()
            .any(|a| a.id == id && a.user_id == user_id);
        if !owned {
            return Ok(false);
        }

        for address in state.addresses.iter_mut().filter(|a| a.user_id == user_id) {
            address.is_user_selected = address.id == id;
        }
        Ok(true)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state
            .orders
            .iter()
            .any(|o| o.id == order.id || o.razorpay_id == order.razorpay_id)
        {
            return Err(RepositoryError::Conflict("order already exists".to_owned()));
        }
        state.orders.push(order.clone());
        Ok(())
    }

    async fn find_order(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .orders
            .iter()
            .find(|o| o.id == id && o.user_id == user_id)
            .cloned())
    }

    async fn count_orders(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
    ) -> Result<u64, RepositoryError> {
        let state = self.state.lock().await;
        let count = state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id && status.is_none_or(|s| o.status == s))
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn list_orders(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Order>, RepositoryError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id && status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(orders
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn mark_paid(
        &self,
        user_id: UserId,
        id: OrderId,
        razorpay_id: &str,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MarkPaid, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(order) = state
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.user_id == user_id && o.razorpay_id == razorpay_id)
        else {
            return Ok(MarkPaid::NotFound);
        };

        Ok(match order.payment_status {
            PaymentStatus::Pending => {
                order.mark_paid(payment_id, now);
                MarkPaid::Updated
            }
            PaymentStatus::Completed if order.payment_id.as_deref() == Some(payment_id) => {
                MarkPaid::AlreadyCompleted
            }
            PaymentStatus::Completed | PaymentStatus::Failed => MarkPaid::NotFound,
        })
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::SecretString;
use sqlx::PgPool;

use crate::config::{CommerceSettings, StorefrontConfig};
use crate::db::{StoreHealth, Stores};
use crate::services::{
    AddressService, CartLocks, CartService, CatalogService, OrderService, PaymentProvider,
    PaymentProviderError, PaymentVerifier, RazorpayClient,
};

/// Payment gateway wiring: the client plus the merchant key pair.
#[derive(Clone)]
pub struct Gateway {
    pub provider: Arc<dyn PaymentProvider>,
    /// Public key id, handed to the browser at checkout.
    pub key_id: String,
    /// Secret used to verify payment signatures.
    pub key_secret: SecretString,
}

/// Application state shared across all handlers.
///
/// Cheap to clone; every service is built once here.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    health: Arc<dyn StoreHealth>,
    catalog: CatalogService,
    cart: CartService,
    addresses: AddressService,
    orders: OrderService,
    payments: PaymentVerifier,
}

impl AppState {
    /// Production state: `PostgreSQL` stores and the Razorpay client.
    ///
    /// Gateway calls share the per-operation deadline as their HTTP timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the Razorpay HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig, pool: PgPool) -> Result<Self, PaymentProviderError> {
        let client = RazorpayClient::new(&config.razorpay, config.commerce.operation_timeout)?;
        let gateway = Gateway {
            provider: Arc::new(client),
            key_id: config.razorpay.key_id.clone(),
            key_secret: config.razorpay.key_secret.clone(),
        };
        Ok(Self::with_stores(Stores::postgres(pool), gateway, config.commerce))
    }

    /// Build state over arbitrary stores and gateway.
    ///
    /// The cart service and the payment verifier share one lock table so a
    /// post-payment cart clear cannot interleave with a cart edit.
    #[must_use]
    pub fn with_stores(stores: Stores, gateway: Gateway, settings: CommerceSettings) -> Self {
        let locks = CartLocks::new();
        let timeout = settings.operation_timeout;

        let catalog = CatalogService::new(stores.catalog.clone(), timeout);
        let cart = CartService::new(
            stores.carts.clone(),
            stores.catalog.clone(),
            locks.clone(),
            settings,
        );
        let addresses = AddressService::new(stores.addresses.clone(), timeout);
        let orders = OrderService::new(
            stores.carts.clone(),
            stores.addresses.clone(),
            stores.orders.clone(),
            gateway.provider,
            gateway.key_id,
            settings,
        );
        let payments = PaymentVerifier::new(
            stores.orders,
            stores.carts,
            locks,
            gateway.key_secret,
            settings,
        );

        Self {
            inner: Arc::new(AppStateInner {
                health: stores.health,
                catalog,
                cart,
                addresses,
                orders,
                payments,
            }),
        }
    }

    /// Store connectivity probe used by the readiness check.
    #[must_use]
    pub fn health(&self) -> &dyn StoreHealth {
        self.inner.health.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    #[must_use]
    pub fn addresses(&self) -> &AddressService {
        &self.inner.addresses
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn payments(&self) -> &PaymentVerifier {
        &self.inner.payments
    }
}

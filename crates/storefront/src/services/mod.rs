//! Business logic services for storefront.
//!
//! # Services
//!
//! - `catalog` - Product lookup
//! - `cart` - Cart mutations, listing and totals
//! - `addresses` - Address book
//! - `orders` - Checkout and order history
//! - `payments` - Payment signature verification
//! - `razorpay` - Payment gateway client
//!
//! Every operation runs under one deadline
//! ([`CommerceSettings::operation_timeout`](crate::config::CommerceSettings))
//! and fails with [`CommerceError::Timeout`] when it is exceeded. Nothing is
//! retried.

pub mod addresses;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod locks;
pub mod orders;
pub mod payments;
pub mod razorpay;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::time::Duration;

pub use addresses::AddressService;
pub use cart::CartService;
pub use catalog::CatalogService;
pub use error::{CommerceError, ErrorKind};
pub use locks::CartLocks;
pub use orders::OrderService;
pub use payments::PaymentVerifier;
pub use razorpay::{PaymentProvider, PaymentProviderError, RazorpayClient};

use crate::db::RepositoryError;

/// Run `operation` under `timeout`.
pub(crate) async fn with_deadline<T, F>(
    timeout: Duration,
    operation: &'static str,
    future: F,
) -> Result<T, CommerceError>
where
    F: Future<Output = Result<T, CommerceError>>,
{
    if let Ok(result) = tokio::time::timeout(timeout, future).await {
        result
    } else {
        tracing::warn!(operation, timeout_ms = timeout.as_millis(), "operation timed out");
        Err(CommerceError::Timeout)
    }
}

/// Run a cleanup step whose failure must not fail the caller.
///
/// Errors and timeouts are logged and swallowed.
pub(crate) async fn best_effort<F>(timeout: Duration, cleanup: &'static str, future: F)
where
    F: Future<Output = Result<(), RepositoryError>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(cleanup, error = %e, "best-effort cleanup failed"),
        Err(_) => tracing::warn!(cleanup, "best-effort cleanup timed out"),
    }
}

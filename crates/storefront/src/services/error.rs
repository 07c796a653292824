//! Commerce error taxonomy.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::razorpay::PaymentProviderError;

/// Errors raised by the cart, order, payment and address services.
///
/// The `Display` text of the client-facing variants is what shoppers see.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// Malformed input (bad id, missing field, unknown currency).
    #[error("{0}")]
    Validation(String),

    /// `(region, size)` is not in the size table.
    #[error("Invalid size and region")]
    InvalidSizeRegion,

    #[error("Product not found")]
    ProductNotFound,

    #[error("User not found")]
    UserNotFound,

    /// Increment requested for a line the cart does not have.
    #[error("Product with specified size not found in cart")]
    ItemNotInCart,

    #[error("Cart is empty")]
    CartEmpty,

    /// Address missing or owned by someone else.
    #[error("Address not found or doesn't belong to user")]
    AddressNotOwned,

    #[error("Address not found")]
    AddressNotFound,

    /// Order missing or owned by someone else.
    #[error("Order not found or doesn't belong to user")]
    OrderNotFound,

    #[error("Invalid payment signature")]
    SignatureMismatch,

    /// Payment gateway call failed.
    #[error("payment provider error: {0}")]
    PaymentProvider(#[from] PaymentProviderError),

    /// Store I/O failed.
    #[error("store error: {0}")]
    Store(#[from] RepositoryError),

    /// The operation did not finish within its deadline.
    #[error("Operation timed out")]
    Timeout,
}

/// Coarse error classes used for status mapping and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    /// Exists but belongs to another user; reported as not found.
    Authorization,
    ExternalProvider,
    Store,
    Timeout,
}

impl CommerceError {
    /// Taxonomy class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::InvalidSizeRegion
            | Self::CartEmpty
            | Self::SignatureMismatch => ErrorKind::Validation,
            Self::ProductNotFound
            | Self::UserNotFound
            | Self::ItemNotInCart
            | Self::AddressNotFound
            | Self::OrderNotFound => ErrorKind::NotFound,
            Self::AddressNotOwned => ErrorKind::Authorization,
            Self::PaymentProvider(_) => ErrorKind::ExternalProvider,
            Self::Store(_) => ErrorKind::Store,
            Self::Timeout => ErrorKind::Timeout,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

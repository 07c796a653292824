//! Core types for Stride.
//!
//! Type-safe IDs, money, sizing and the cart/order domain model.

pub mod address;
pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod size;
pub mod status;

pub use address::{Address, AddressFields};
pub use cart::{Cart, CartItem, CartPage, CartTotals, Decrement, total_pages};
pub use id::*;
pub use order::{NewOrder, Order, OrderItem, OrderItemSummary, OrderSummary};
pub use price::{AmountError, CurrencyCode, CurrencyError, to_minor_units};
pub use product::Product;
pub use size::*;
pub use status::*;

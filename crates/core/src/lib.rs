//! Stride Core - Shared types library.
//!
//! This crate provides the domain model used across all Stride components:
//! - `storefront` - Shopper-facing cart, checkout and payment API
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure cart/order rules - no I/O, no
//! database access, no HTTP clients. With the `postgres` feature the IDs and
//! status enums also implement the `sqlx` encoding traits.
//!
//! # Modules
//!
//! - [`types`] - IDs, currency, sizing, products, carts, orders and addresses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

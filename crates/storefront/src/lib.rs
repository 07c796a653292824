//! Stride storefront library.
//!
//! Cart, checkout, payment verification and address book behind a JSON API.
//! The binary in `main.rs` wires this crate to `PostgreSQL` and Razorpay; the
//! integration tests drive the same router over the in-memory store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

//! HTTP middleware for the storefront API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Caller identity is not a layer: handlers that need a shopper take the
//! [`RequireUser`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::{RequireUser, USER_ID_HEADER};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};

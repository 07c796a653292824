//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user's id in the `x-user-id` header. Handlers that act on a shopper's data
//! take [`RequireUser`].

use axum::{extract::FromRequestParts, http::request::Parts};

use stride_core::UserId;

use crate::error::{AppError, set_sentry_user};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user_id): RequireUser) -> impl IntoResponse {
///     user_id.to_string()
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireUser(pub UserId);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("User ID not found in token".to_owned()))?;

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|value| UserId::parse(value.trim()).ok())
            .ok_or_else(|| AppError::Unauthorized("Invalid User ID format".to_owned()))?;

        tracing::Span::current().record("user_id", tracing::field::display(user_id));
        set_sentry_user(&user_id);
        Ok(Self(user_id))
    }
}

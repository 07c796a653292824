//! HTTP error boundary with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Failures are rendered as the
//! standard JSON envelope with `result: null`; server-class failures are
//! captured to Sentry and their details are never sent to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::routes::ApiResponse;
use crate::services::{CommerceError, ErrorKind};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A service operation failed.
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// Request could not be decoded.
    #[error("{0}")]
    BadRequest(String),

    /// Caller identity missing or unusable.
    #[error("{0}")]
    Unauthorized(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Commerce(err) => match err.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                // Foreign resources are indistinguishable from missing ones
                ErrorKind::NotFound | ErrorKind::Authorization => StatusCode::NOT_FOUND,
                ErrorKind::ExternalProvider => StatusCode::BAD_GATEWAY,
                ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    const fn is_server_error(&self) -> bool {
        match self {
            Self::Commerce(err) => matches!(
                err.kind(),
                ErrorKind::Store | ErrorKind::ExternalProvider | ErrorKind::Timeout
            ),
            Self::BadRequest(_) | Self::Unauthorized(_) => false,
        }
    }

    /// Message safe to show the client.
    fn client_message(&self) -> String {
        match self {
            Self::Commerce(err) => match err.kind() {
                ErrorKind::Store => "Internal server error".to_owned(),
                ErrorKind::ExternalProvider => "Payment service error".to_owned(),
                _ => err.to_string(),
            },
            Self::BadRequest(msg) | Self::Unauthorized(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let status = self.status();
        let body: ApiResponse<()> = ApiResponse::failure(status, self.client_message());
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Associate subsequent Sentry events with a user.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

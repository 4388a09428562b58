//! Application error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::oauth2::types::OAuthError;
use crate::store::StoreError;

/// Application error taxonomy
///
/// Upstream auth failures are handled inside the callback handler (they
/// become toasts and redirects, not error responses); everything that
/// reaches this type propagates as an HTTP status.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error (bad secret, unbuildable provider)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown route parameter (e.g. an unconfigured provider name)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request requires an authenticated session
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Storage failure
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// OAuth2 failure outside the callback's toast handling
    #[error("OAuth2 error: {0}")]
    OAuth(#[from] OAuthError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Config(_) | Self::Store(_) | Self::OAuth(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, self.to_string()).into_response()
    }
}

//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client with a JSON body `{"error": "..."}`. All
//! route handlers return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::ServiceError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Service or repository operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        Self::Service(ServiceError::Repository(err))
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Service(ServiceError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Service(ServiceError::Repository(err)) => match err {
                RepositoryError::AmountOutOfRange(_) => StatusCode::BAD_REQUEST,
                RepositoryError::NotFound(_) | RepositoryError::UnknownProduct(_) => {
                    StatusCode::NOT_FOUND
                }
                RepositoryError::AddressInUse | RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Service(ServiceError::Cascade { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients.
    fn public_message(&self) -> String {
        match self {
            Self::Service(ServiceError::Cascade { address_id, .. }) => {
                format!("address {address_id} was saved, but its orders could not be updated")
            }
            _ if self.status_code().is_server_error() => "Internal server error".to_owned(),
            Self::Service(err) => err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = Json(json!({ "error": self.public_message() }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

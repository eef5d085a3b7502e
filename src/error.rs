use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::services::preview::PreviewError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// A required collaborator is not configured.
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// An upstream service failed or answered with garbage.
    #[error("upstream failure: {0}")]
    Upstream(String),
    /// Rendering or other internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PreviewError> for ServiceError {
    fn from(err: PreviewError) -> Self {
        match err {
            PreviewError::NotConfigured => ServiceError::Unavailable(err.to_string()),
            PreviewError::Status { status, .. } if status == reqwest::StatusCode::NOT_FOUND => {
                ServiceError::NotFound(err.to_string())
            }
            PreviewError::Aborted
            | PreviewError::ClientBuilder { .. }
            | PreviewError::InvalidBaseUrl { .. }
            | PreviewError::Transport { .. }
            | PreviewError::Status { .. }
            | PreviewError::Malformed { .. } => ServiceError::Upstream(err.to_string()),
        }
    }
}

impl From<askama::Error> for ServiceError {
    fn from(err: askama::Error) -> Self {
        ServiceError::Internal(format!("template rendering failed: {err}"))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Upstream dependency failed.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    /// Service unavailable or not configured.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Unavailable(message) => AppError::ServiceUnavailable(message),
            ServiceError::Upstream(message) => AppError::BadGateway(message),
            ServiceError::Internal(message) => AppError::Internal(message),
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable description.
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

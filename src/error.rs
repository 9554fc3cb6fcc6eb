//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::events::ProducerError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("community not found: {0}")]
    CommunityNotFound(String),

    // Server errors (5xx)
    #[error("store error: {0}")]
    Store(StoreError),

    #[error("event serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("event publish error: {0}")]
    Publish(#[from] ProducerError),

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound(id) => AppError::UserNotFound(id),
            StoreError::CommunityNotFound(id) => AppError::CommunityNotFound(id),
            other => AppError::Store(other),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 404 Not Found
            AppError::UserNotFound(id) => {
                (StatusCode::NOT_FOUND, "user_not_found", Some(id.clone()))
            }
            AppError::CommunityNotFound(id) => (
                StatusCode::NOT_FOUND,
                "community_not_found",
                Some(id.clone()),
            ),

            // 500 Internal Server Error
            AppError::Store(e) => {
                tracing::error!("Store error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None)
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "serialization_error",
                    None,
                )
            }
            AppError::Publish(e) => {
                // The graph mutation already committed; the caller may
                // retry the whole operation safely.
                tracing::error!("Publish error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "publish_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

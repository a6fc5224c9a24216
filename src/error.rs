//! Error types for Course Market.
//!
//! Defines a unified error type that maps cleanly to HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Unified error type for Course Market operations.
#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Course {0} already purchased")]
    DuplicatePurchase(Uuid),

    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body for API clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl MarketError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            MarketError::NotFound(_) => "NOT_FOUND",
            MarketError::Validation(_) => "VALIDATION_ERROR",
            MarketError::Conflict(_) => "CONFLICT",
            MarketError::DuplicatePurchase(_) => "DUPLICATE_PURCHASE",
            MarketError::InvalidCredential => "INVALID_CREDENTIAL",
            MarketError::Database(_) => "DATABASE_ERROR",
            MarketError::Storage(_) => "STORAGE_ERROR",
            MarketError::Serialization(_) => "SERIALIZATION_ERROR",
            MarketError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            MarketError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            MarketError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            MarketError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            MarketError::DuplicatePurchase(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            MarketError::InvalidCredential => (StatusCode::UNAUTHORIZED, self.to_string()),
            MarketError::Database(e) => {
                // Log the actual error but don't expose internals
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            MarketError::Storage(e) => {
                tracing::error!(error = %e, "Storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A storage error occurred".to_string(),
                )
            }
            MarketError::Serialization(e) => {
                tracing::error!(error = %e, "Serialization error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process stored data".to_string(),
                )
            }
            MarketError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

/// A body axum could not read as JSON is a client error like any other.
impl From<JsonRejection> for MarketError {
    fn from(rejection: JsonRejection) -> Self {
        MarketError::Validation(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

/// Result type alias for Course Market operations.
pub type MarketResult<T> = Result<T, MarketError>;

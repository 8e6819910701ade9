//! Error handling for the batch inventory server
//!
//! Domain failures keep their kind all the way to the HTTP response; database
//! and internal failures are logged and reported without detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::InventoryError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Business rule errors
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Inventory(err) => match err {
                InventoryError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
                InventoryError::NotFound(_) => StatusCode::NOT_FOUND,
                InventoryError::BatchNotActive(_) => StatusCode::CONFLICT,
                InventoryError::InsufficientBatchQuantity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                InventoryError::InsufficientStock { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                InventoryError::SameBranch => StatusCode::UNPROCESSABLE_ENTITY,
                InventoryError::AllocationConflict(_) => StatusCode::CONFLICT,
            },
            AppError::DatabaseError(_)
            | AppError::Configuration(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> ErrorDetail {
        match self {
            AppError::Inventory(err) => ErrorDetail {
                code: err.code().to_string(),
                message: err.to_string(),
                field: err.field().map(str::to_string),
            },
            AppError::DatabaseError(_) => ErrorDetail {
                code: "DATABASE_ERROR".to_string(),
                message: "A database error occurred".to_string(),
                field: None,
            },
            AppError::Configuration(msg) => ErrorDetail {
                code: "CONFIGURATION_ERROR".to_string(),
                message: format!("Configuration error: {}", msg),
                field: None,
            },
            AppError::InternalError(_) => ErrorDetail {
                code: "INTERNAL_ERROR".to_string(),
                message: "An internal server error occurred".to_string(),
                field: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!(code = %detail.code, "Rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

/// Map a unique-index violation to an invalid-input error on `field`
pub fn unique_violation(err: sqlx::Error, field: &str, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Inventory(InventoryError::invalid(field, message))
        }
        _ => AppError::DatabaseError(err),
    }
}

//! Domain errors for batch allocation and transfer
//!
//! Every operation in the core returns one of these kinds. The backend maps
//! them onto HTTP responses; the wasm bindings surface them as strings.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Failure kinds returned by registry, ledger and transfer operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InventoryError {
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("Batch {0} is not active")]
    BatchNotActive(Uuid),

    #[error("Insufficient batch quantity: requested {requested}, available {available}")]
    InsufficientBatchQuantity { requested: i32, available: i32 },

    #[error("Insufficient stock: requested {requested}, on hand {on_hand}")]
    InsufficientStock { requested: i32, on_hand: i32 },

    #[error("Source and target branch are the same")]
    SameBranch,

    #[error("Allocation conflict: {0}")]
    AllocationConflict(String),
}

impl InventoryError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        InventoryError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str) -> Self {
        InventoryError::NotFound(resource.to_string())
    }

    /// Stable machine-readable code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            InventoryError::InvalidInput { .. } => "INVALID_INPUT",
            InventoryError::NotFound(_) => "NOT_FOUND",
            InventoryError::BatchNotActive(_) => "BATCH_NOT_ACTIVE",
            InventoryError::InsufficientBatchQuantity { .. } => "INSUFFICIENT_BATCH_QUANTITY",
            InventoryError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            InventoryError::SameBranch => "SAME_BRANCH",
            InventoryError::AllocationConflict(_) => "ALLOCATION_CONFLICT",
        }
    }

    /// Field the error refers to, when it is tied to a single input
    pub fn field(&self) -> Option<&str> {
        match self {
            InventoryError::InvalidInput { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Result alias for domain operations
pub type InventoryResult<T> = Result<T, InventoryError>;

//! Products and branches as seen by the allocation core
//!
//! Both are owned by the surrounding CRUD screens; the core only reads them
//! to check existence and the active flag.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InventoryError, InventoryResult};

/// A kind of good that batches are received for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub unit: String,
    pub unit_price: Decimal,
    pub active: bool,
}

impl Product {
    pub fn ensure_active(&self) -> InventoryResult<()> {
        if !self.active {
            return Err(InventoryError::invalid(
                "product_id",
                format!("product {} is inactive", self.sku),
            ));
        }
        Ok(())
    }
}

/// A store location that holds branch stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
}

impl Branch {
    pub fn ensure_active(&self, field: &str) -> InventoryResult<()> {
        if !self.active {
            return Err(InventoryError::invalid(
                field,
                format!("branch {} is inactive", self.name),
            ));
        }
        Ok(())
    }
}

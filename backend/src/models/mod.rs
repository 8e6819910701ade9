//! Database models for the batch inventory server
//!
//! Re-exports models from the shared crate and adds the row types used to
//! read them from PostgreSQL.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

pub use shared::models::*;

/// Row of the `batches` table
#[derive(Debug, FromRow)]
pub struct BatchRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub batch_number: String,
    pub quantity: i32,
    pub expiration_date: NaiveDate,
    pub warning_days_before_expiration: i32,
    pub notification_enabled: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BatchRow> for Batch {
    fn from(row: BatchRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            batch_number: row.batch_number,
            quantity: row.quantity,
            expiration_date: row.expiration_date,
            warning_days_before_expiration: row.warning_days_before_expiration,
            notification_enabled: row.notification_enabled,
            active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row of the `branch_stocks` table
#[derive(Debug, FromRow)]
pub struct BranchStockRow {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub product_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: i32,
    pub minimum_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BranchStockRow> for BranchStock {
    fn from(row: BranchStockRow) -> Self {
        Self {
            id: row.id,
            branch_id: row.branch_id,
            product_id: row.product_id,
            batch_id: row.batch_id,
            quantity: row.quantity,
            minimum_stock: row.minimum_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row of the `products` table
#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub unit: String,
    pub unit_price: Decimal,
    pub is_active: bool,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            sku: row.sku,
            name: row.name,
            brand: row.brand,
            unit: row.unit,
            unit_price: row.unit_price,
            active: row.is_active,
        }
    }
}

/// Row of the `branches` table
#[derive(Debug, FromRow)]
pub struct BranchRow {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            active: row.is_active,
        }
    }
}

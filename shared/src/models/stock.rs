//! Branch stock (allocation) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A grant of units from one batch to one branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchStock {
    pub id: Uuid,
    pub branch_id: Uuid,
    /// Copied from the batch for per-product queries
    pub product_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: i32,
    pub minimum_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Quantity has fallen to or below the configured minimum
pub fn is_low_stock(quantity: i32, minimum_stock: i32) -> bool {
    quantity <= minimum_stock
}

impl BranchStock {
    pub fn is_low_stock(&self) -> bool {
        is_low_stock(self.quantity, self.minimum_stock)
    }
}

/// Branch stock with derived low-stock flag, as returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchStockView {
    #[serde(flatten)]
    pub stock: BranchStock,
    pub low_stock: bool,
}

impl From<BranchStock> for BranchStockView {
    fn from(stock: BranchStock) -> Self {
        let low_stock = stock.is_low_stock();
        Self { stock, low_stock }
    }
}

/// Input for allocating part of a batch to a branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub branch_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub minimum_stock: i32,
}

/// Total a branch holds of one batch across all its grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchHolding {
    pub branch_id: Uuid,
    pub batch_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub grant_count: usize,
}

/// Aggregate grants into one holding per (branch, batch), in first-seen order
pub fn aggregate_holdings(stocks: &[BranchStock]) -> Vec<BranchHolding> {
    let mut holdings: Vec<BranchHolding> = Vec::new();
    for stock in stocks {
        match holdings
            .iter_mut()
            .find(|h| h.branch_id == stock.branch_id && h.batch_id == stock.batch_id)
        {
            Some(holding) => {
                holding.quantity += i64::from(stock.quantity);
                holding.grant_count += 1;
            }
            None => holdings.push(BranchHolding {
                branch_id: stock.branch_id,
                batch_id: stock.batch_id,
                product_id: stock.product_id,
                quantity: i64::from(stock.quantity),
                grant_count: 1,
            }),
        }
    }
    holdings
}

//! Allocation ledger service
//!
//! Grants, adjusts and releases branch stock rows. Every mutation locks the
//! owning batch row first, so two requests against the same batch can never
//! both pass the availability check.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use shared::{
    aggregate_holdings, validate_non_negative, validate_positive_quantity, AllocationRequest,
    Availability, BatchLedger, BranchHolding, BranchStock, BranchStockView, Clock, InventoryError,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::BranchStockRow;
use crate::services::{directory, store, DirectoryService};

/// Allocation ledger service
#[derive(Clone)]
pub struct AllocationService {
    db: PgPool,
    clock: Arc<dyn Clock>,
}

/// Input for setting a stock row's quantity
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub quantity: i32,
}

/// Input for changing a stock row's low-stock threshold
#[derive(Debug, Deserialize)]
pub struct MinimumStockInput {
    pub minimum_stock: i32,
}

/// Optional branch filter for the low-stock report
#[derive(Debug, Default, Deserialize)]
pub struct LowStockFilter {
    pub branch_id: Option<Uuid>,
}

impl AllocationService {
    /// Create a new AllocationService instance
    pub fn new(db: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Units of a batch not yet granted to any branch
    pub async fn availability(&self, batch_id: Uuid) -> AppResult<Availability> {
        let batch = store::fetch_batch(&self.db, batch_id).await?;

        let mut conn = self.db.acquire().await?;
        let stocks = store::fetch_batch_stocks(&mut conn, batch_id).await?;

        Ok(BatchLedger::new(batch, stocks).availability())
    }

    /// Grant units of a batch to a branch
    pub async fn allocate(&self, request: AllocationRequest) -> AppResult<BranchStockView> {
        validate_positive_quantity("quantity", request.quantity)?;
        validate_non_negative("minimum_stock", request.minimum_stock)?;

        let today = self.clock.today();
        let mut tx = self.db.begin().await?;
        let mut ledger = store::lock_ledger(&mut tx, request.batch_id).await?;

        // batch state is reported ahead of branch problems
        if !ledger.batch().accepts_allocations(today) {
            return Err(InventoryError::BatchNotActive(request.batch_id).into());
        }
        directory::require_active_branch(&mut tx, request.branch_id, "branch_id").await?;

        let stock = ledger.allocate(&request, today, Uuid::new_v4(), Utc::now())?;
        store::persist_changes(&mut tx, ledger.take_changes()).await?;
        tx.commit().await?;

        tracing::info!(
            stock_id = %stock.id,
            batch_id = %stock.batch_id,
            branch_id = %stock.branch_id,
            quantity = stock.quantity,
            "Allocated batch stock to branch"
        );

        Ok(stock.into())
    }

    /// Set a stock row's quantity; zero removes the row
    pub async fn adjust(&self, stock_id: Uuid, input: AdjustStockInput) -> AppResult<BranchStockView> {
        let stock = store::find_stock(&self.db, stock_id).await?;

        let mut tx = self.db.begin().await?;
        let mut ledger = store::lock_ledger(&mut tx, stock.batch_id).await?;
        let adjusted = ledger.adjust(stock_id, input.quantity, Utc::now())?;
        store::persist_changes(&mut tx, ledger.take_changes()).await?;
        tx.commit().await?;

        tracing::info!(
            %stock_id,
            from = stock.quantity,
            to = adjusted.quantity,
            "Adjusted branch stock"
        );

        Ok(adjusted.into())
    }

    /// Change the low-stock threshold of a stock row
    pub async fn update_minimum_stock(
        &self,
        stock_id: Uuid,
        input: MinimumStockInput,
    ) -> AppResult<BranchStockView> {
        let stock = store::find_stock(&self.db, stock_id).await?;

        let mut tx = self.db.begin().await?;
        let mut ledger = store::lock_ledger(&mut tx, stock.batch_id).await?;
        let updated = ledger.set_minimum_stock(stock_id, input.minimum_stock, Utc::now())?;
        store::persist_changes(&mut tx, ledger.take_changes()).await?;
        tx.commit().await?;

        Ok(updated.into())
    }

    /// Delete a stock row, returning its units to the batch
    pub async fn release(&self, stock_id: Uuid) -> AppResult<BranchStock> {
        let stock = store::find_stock(&self.db, stock_id).await?;

        let mut tx = self.db.begin().await?;
        let mut ledger = store::lock_ledger(&mut tx, stock.batch_id).await?;
        let released = ledger.release(stock_id)?;
        store::persist_changes(&mut tx, ledger.take_changes()).await?;
        tx.commit().await?;

        tracing::info!(%stock_id, quantity = released.quantity, "Released branch stock");

        Ok(released)
    }

    /// Stock rows held by a branch
    pub async fn list_by_branch(&self, branch_id: Uuid) -> AppResult<Vec<BranchStockView>> {
        DirectoryService::new(self.db.clone()).get_branch(branch_id).await?;

        let rows = sqlx::query_as::<_, BranchStockRow>(
            r#"
            SELECT id, branch_id, product_id, batch_id, quantity, minimum_stock, created_at, updated_at
            FROM branch_stocks
            WHERE branch_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(into_views(rows))
    }

    /// Stock rows of a product across all branches
    pub async fn list_by_product(&self, product_id: Uuid) -> AppResult<Vec<BranchStockView>> {
        DirectoryService::new(self.db.clone()).get_product(product_id).await?;

        let rows = sqlx::query_as::<_, BranchStockRow>(
            r#"
            SELECT id, branch_id, product_id, batch_id, quantity, minimum_stock, created_at, updated_at
            FROM branch_stocks
            WHERE product_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(into_views(rows))
    }

    /// Stock rows granted from a batch
    pub async fn list_by_batch(&self, batch_id: Uuid) -> AppResult<Vec<BranchStockView>> {
        store::fetch_batch(&self.db, batch_id).await?;

        let mut conn = self.db.acquire().await?;
        let stocks = store::fetch_batch_stocks(&mut conn, batch_id).await?;

        Ok(stocks.into_iter().map(BranchStockView::from).collect())
    }

    /// Rows at or below their minimum, optionally for one branch
    pub async fn list_low_stock(&self, filter: LowStockFilter) -> AppResult<Vec<BranchStockView>> {
        let rows = sqlx::query_as::<_, BranchStockRow>(
            r#"
            SELECT id, branch_id, product_id, batch_id, quantity, minimum_stock, created_at, updated_at
            FROM branch_stocks
            WHERE quantity <= minimum_stock
              AND ($1::uuid IS NULL OR branch_id = $1)
            ORDER BY branch_id, created_at ASC, id ASC
            "#,
        )
        .bind(filter.branch_id)
        .fetch_all(&self.db)
        .await?;

        Ok(into_views(rows))
    }

    /// Per-batch totals for a branch, summing all of its grants
    pub async fn branch_holdings(&self, branch_id: Uuid) -> AppResult<Vec<BranchHolding>> {
        DirectoryService::new(self.db.clone()).get_branch(branch_id).await?;

        let rows = sqlx::query_as::<_, BranchStockRow>(
            r#"
            SELECT id, branch_id, product_id, batch_id, quantity, minimum_stock, created_at, updated_at
            FROM branch_stocks
            WHERE branch_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(branch_id)
        .fetch_all(&self.db)
        .await?;

        let stocks: Vec<BranchStock> = rows.into_iter().map(BranchStock::from).collect();
        Ok(aggregate_holdings(&stocks))
    }
}

fn into_views(rows: Vec<BranchStockRow>) -> Vec<BranchStockView> {
    rows.into_iter()
        .map(|row| BranchStockView::from(BranchStock::from(row)))
        .collect()
}

//! Transfer coordinator service
//!
//! Moves units between two branches' holdings of the same batch. The batch is
//! locked, the request validated against the locked ledger, and both rows are
//! written in one transaction; a rejected transfer writes nothing.

use chrono::Utc;
use shared::{TransferOutcome, TransferRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::{directory, store};

/// Transfer coordinator service
#[derive(Clone)]
pub struct TransferService {
    db: PgPool,
}

impl TransferService {
    /// Create a new TransferService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Move `quantity` units from a stock row to another branch
    pub async fn transfer(&self, request: TransferRequest) -> AppResult<TransferOutcome> {
        let source = store::find_stock(&self.db, request.source_stock_id).await?;

        let mut tx = self.db.begin().await?;
        let mut ledger = store::lock_ledger(&mut tx, source.batch_id).await?;

        let validated = ledger.validate_transfer(&request)?;
        directory::require_active_branch(&mut tx, validated.target_branch_id(), "target_branch_id")
            .await?;

        let outcome = ledger.apply_transfer(validated, Uuid::new_v4(), Utc::now())?;
        store::persist_changes(&mut tx, ledger.take_changes()).await?;
        tx.commit().await?;

        tracing::info!(
            batch_id = %outcome.batch_id,
            source_branch_id = %outcome.source.branch_id,
            target_branch_id = %outcome.target.branch_id,
            quantity = outcome.quantity,
            source_released = outcome.source_released,
            target_created = outcome.target_created,
            "Transferred branch stock"
        );

        Ok(outcome)
    }
}

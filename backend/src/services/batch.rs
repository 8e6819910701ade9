//! Batch registry service
//!
//! Registers inbound batches, applies conflict-checked updates and retires
//! batches manually or through the expiration sweep. Expired / expiring-soon
//! state is derived on every read.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared::{
    deactivate_expired, filter_expired, filter_expiring_soon, Batch, BatchUpdate, BatchView, Clock,
    InventoryError, NewBatch,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{unique_violation, AppResult};
use crate::models::BatchRow;
use crate::services::{store, DirectoryService};

/// Batch registry service
#[derive(Clone)]
pub struct BatchService {
    db: PgPool,
    clock: Arc<dyn Clock>,
}

/// Filters for listing batches
#[derive(Debug, Default, Deserialize)]
pub struct BatchFilter {
    pub product_id: Option<Uuid>,
    pub active: Option<bool>,
    pub as_of: Option<NaiveDate>,
}

impl BatchService {
    /// Create a new BatchService instance
    pub fn new(db: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Register an inbound batch
    pub async fn register_batch(&self, input: NewBatch) -> AppResult<BatchView> {
        let today = self.clock.today();
        input.validate(today)?;

        DirectoryService::new(self.db.clone())
            .require_active_product(input.product_id)
            .await?;

        let duplicate = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM batches WHERE product_id = $1 AND batch_number = $2 AND is_active)",
        )
        .bind(input.product_id)
        .bind(input.batch_number.trim())
        .fetch_one(&self.db)
        .await?;

        if duplicate {
            return Err(InventoryError::invalid(
                "batch_number",
                "an active batch with this number already exists for the product",
            )
            .into());
        }

        let batch = input.into_batch(Uuid::new_v4(), Utc::now());

        sqlx::query(
            r#"
            INSERT INTO batches (
                id, product_id, batch_number, quantity, expiration_date,
                warning_days_before_expiration, notification_enabled, is_active,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(batch.id)
        .bind(batch.product_id)
        .bind(&batch.batch_number)
        .bind(batch.quantity)
        .bind(batch.expiration_date)
        .bind(batch.warning_days_before_expiration)
        .bind(batch.notification_enabled)
        .bind(batch.active)
        .bind(batch.created_at)
        .bind(batch.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| {
            unique_violation(
                e,
                "batch_number",
                "an active batch with this number already exists for the product",
            )
        })?;

        tracing::info!(
            batch_id = %batch.id,
            product_id = %batch.product_id,
            quantity = batch.quantity,
            "Registered batch {}",
            batch.batch_number
        );

        Ok(BatchView::new(batch, today))
    }

    /// Get a batch with its derived state
    pub async fn get_batch(&self, batch_id: Uuid, as_of: Option<NaiveDate>) -> AppResult<BatchView> {
        let batch = store::fetch_batch(&self.db, batch_id).await?;
        let as_of = as_of.unwrap_or_else(|| self.clock.today());
        Ok(BatchView::new(batch, as_of))
    }

    /// List batches, optionally by product and active flag
    pub async fn list_batches(&self, filter: BatchFilter) -> AppResult<Vec<BatchView>> {
        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, product_id, batch_number, quantity, expiration_date,
                   warning_days_before_expiration, notification_enabled, is_active,
                   created_at, updated_at
            FROM batches
            WHERE ($1::uuid IS NULL OR product_id = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY expiration_date ASC, batch_number ASC
            "#,
        )
        .bind(filter.product_id)
        .bind(filter.active)
        .fetch_all(&self.db)
        .await?;

        let as_of = filter.as_of.unwrap_or_else(|| self.clock.today());
        Ok(rows
            .into_iter()
            .map(|row| BatchView::new(row.into(), as_of))
            .collect())
    }

    /// Update batch fields under the batch lock
    ///
    /// Quantity may not drop below what is already allocated to branches.
    pub async fn update_batch(&self, batch_id: Uuid, update: BatchUpdate) -> AppResult<BatchView> {
        let mut tx = self.db.begin().await?;
        let mut ledger = store::lock_ledger(&mut tx, batch_id).await?;

        if let Some(batch_number) = &update.batch_number {
            let taken = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM batches
                    WHERE product_id = $1 AND batch_number = $2 AND is_active AND id <> $3
                )
                "#,
            )
            .bind(ledger.batch().product_id)
            .bind(batch_number.trim())
            .bind(batch_id)
            .fetch_one(&mut *tx)
            .await?;

            if taken && ledger.batch().active {
                return Err(InventoryError::invalid(
                    "batch_number",
                    "an active batch with this number already exists for the product",
                )
                .into());
            }
        }

        let batch = ledger.update_batch(&update, Utc::now())?.clone();
        store::save_batch(&mut tx, &batch).await?;
        tx.commit().await?;

        tracing::info!(%batch_id, quantity = batch.quantity, "Updated batch");

        Ok(BatchView::new(batch, self.clock.today()))
    }

    /// Retire a batch manually; already inactive batches are returned as-is
    pub async fn deactivate_batch(&self, batch_id: Uuid) -> AppResult<BatchView> {
        let mut tx = self.db.begin().await?;
        let ledger = store::lock_ledger(&mut tx, batch_id).await?;
        let mut batch = ledger.batch().clone();

        if batch.active {
            batch.active = false;
            batch.updated_at = Utc::now();
            store::save_batch(&mut tx, &batch).await?;
            tracing::info!(%batch_id, "Deactivated batch {}", batch.batch_number);
        }
        tx.commit().await?;

        Ok(BatchView::new(batch, self.clock.today()))
    }

    /// Deactivate every active batch that has expired as of `as_of`
    ///
    /// Allocations are left untouched. Returns the number of batches retired;
    /// a second run on the same date returns 0.
    pub async fn deactivate_all_expired(&self, as_of: NaiveDate) -> AppResult<u64> {
        let mut tx = self.db.begin().await?;

        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, product_id, batch_number, quantity, expiration_date,
                   warning_days_before_expiration, notification_enabled, is_active,
                   created_at, updated_at
            FROM batches
            WHERE is_active AND expiration_date < $1
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(as_of)
        .fetch_all(&mut *tx)
        .await?;

        let mut batches: Vec<Batch> = rows.into_iter().map(Batch::from).collect();
        let now = Utc::now();
        let count = deactivate_expired(&mut batches, as_of, now);
        if count == 0 {
            tx.commit().await?;
            return Ok(0);
        }

        let retired: Vec<Uuid> = batches.iter().filter(|b| !b.active).map(|b| b.id).collect();
        sqlx::query("UPDATE batches SET is_active = false, updated_at = $1 WHERE id = ANY($2)")
            .bind(now)
            .bind(&retired)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(%as_of, count, "Deactivated expired batches");

        Ok(count as u64)
    }

    /// Active batches inside their warning window
    pub async fn list_expiring_soon(&self, as_of: NaiveDate) -> AppResult<Vec<BatchView>> {
        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, product_id, batch_number, quantity, expiration_date,
                   warning_days_before_expiration, notification_enabled, is_active,
                   created_at, updated_at
            FROM batches
            WHERE is_active
              AND expiration_date >= $1
              AND expiration_date - $1 <= warning_days_before_expiration
            ORDER BY expiration_date ASC, batch_number ASC
            "#,
        )
        .bind(as_of)
        .fetch_all(&self.db)
        .await?;

        let batches: Vec<Batch> = rows.into_iter().map(Batch::from).collect();
        Ok(filter_expiring_soon(&batches, as_of)
            .into_iter()
            .map(|b| BatchView::new(b, as_of))
            .collect())
    }

    /// Batches past their expiration date, whether retired yet or not
    pub async fn list_expired(&self, as_of: NaiveDate) -> AppResult<Vec<BatchView>> {
        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, product_id, batch_number, quantity, expiration_date,
                   warning_days_before_expiration, notification_enabled, is_active,
                   created_at, updated_at
            FROM batches
            WHERE expiration_date < $1
            ORDER BY expiration_date ASC, batch_number ASC
            "#,
        )
        .bind(as_of)
        .fetch_all(&self.db)
        .await?;

        let batches: Vec<Batch> = rows.into_iter().map(Batch::from).collect();
        Ok(filter_expired(&batches, as_of)
            .into_iter()
            .map(|b| BatchView::new(b, as_of))
            .collect())
    }
}

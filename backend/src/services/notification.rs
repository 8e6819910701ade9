//! Expiration notification service
//!
//! Notifications are derived on demand from batch state; nothing is queued
//! or stored. An external daily caller reads them and delivers as it sees fit.

use chrono::NaiveDate;
use shared::{
    attach_allocations, expiring_notifications, Batch, BranchStock, ExpiringNotification,
    ExpiringStockAlert,
};
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{BatchRow, BranchStockRow};

/// Expiration notification service
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Batches that should raise an expiration warning on `as_of`
    pub async fn expiring_notifications(&self, as_of: NaiveDate) -> AppResult<Vec<ExpiringNotification>> {
        let batches = self.candidate_batches(as_of).await?;
        let notifications = expiring_notifications(&batches, as_of);

        tracing::debug!(%as_of, count = notifications.len(), "Derived expiration notifications");

        Ok(notifications)
    }

    /// Expiration warnings with the branch allocations each one affects
    pub async fn expiring_stock(&self, as_of: NaiveDate) -> AppResult<Vec<ExpiringStockAlert>> {
        let notifications = self.expiring_notifications(as_of).await?;
        if notifications.is_empty() {
            return Ok(Vec::new());
        }

        let batch_ids: Vec<_> = notifications.iter().map(|n| n.batch_id).collect();
        let rows = sqlx::query_as::<_, BranchStockRow>(
            r#"
            SELECT id, branch_id, product_id, batch_id, quantity, minimum_stock, created_at, updated_at
            FROM branch_stocks
            WHERE batch_id = ANY($1)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(&batch_ids)
        .fetch_all(&self.db)
        .await?;

        let stocks: Vec<BranchStock> = rows.into_iter().map(BranchStock::from).collect();
        Ok(attach_allocations(notifications, &stocks))
    }

    /// Active, notification-enabled batches inside their warning window
    async fn candidate_batches(&self, as_of: NaiveDate) -> AppResult<Vec<Batch>> {
        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, product_id, batch_number, quantity, expiration_date,
                   warning_days_before_expiration, notification_enabled, is_active,
                   created_at, updated_at
            FROM batches
            WHERE is_active
              AND notification_enabled
              AND expiration_date >= $1
              AND expiration_date - $1 <= warning_days_before_expiration
            "#,
        )
        .bind(as_of)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Batch::from).collect())
    }
}

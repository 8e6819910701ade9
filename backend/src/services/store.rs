//! Row access shared by the batch, allocation and transfer services
//!
//! Mutations of a batch's allocations are serialized by locking the batch row
//! (`SELECT ... FOR UPDATE`) inside the caller's transaction before its stock
//! rows are read. Different batches never contend.

use shared::{Batch, BatchLedger, BranchStock, InventoryError, LedgerChange};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{BatchRow, BranchStockRow};

/// Read a batch without locking
pub async fn fetch_batch(db: &PgPool, batch_id: Uuid) -> AppResult<Batch> {
    let row = sqlx::query_as::<_, BatchRow>(
        r#"
        SELECT id, product_id, batch_number, quantity, expiration_date,
               warning_days_before_expiration, notification_enabled, is_active,
               created_at, updated_at
        FROM batches
        WHERE id = $1
        "#,
    )
    .bind(batch_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| InventoryError::not_found("Batch"))?;

    Ok(row.into())
}

/// Read every stock row of a batch, oldest grant first
pub async fn fetch_batch_stocks(conn: &mut PgConnection, batch_id: Uuid) -> AppResult<Vec<BranchStock>> {
    let rows = sqlx::query_as::<_, BranchStockRow>(
        r#"
        SELECT id, branch_id, product_id, batch_id, quantity, minimum_stock, created_at, updated_at
        FROM branch_stocks
        WHERE batch_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(batch_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(BranchStock::from).collect())
}

/// Read a stock row without locking
pub async fn find_stock(db: &PgPool, stock_id: Uuid) -> AppResult<BranchStock> {
    let row = sqlx::query_as::<_, BranchStockRow>(
        r#"
        SELECT id, branch_id, product_id, batch_id, quantity, minimum_stock, created_at, updated_at
        FROM branch_stocks
        WHERE id = $1
        "#,
    )
    .bind(stock_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| InventoryError::not_found("Branch stock"))?;

    Ok(row.into())
}

/// Lock a batch row and load its ledger
///
/// The lock is held until the surrounding transaction ends.
pub async fn lock_ledger(conn: &mut PgConnection, batch_id: Uuid) -> AppResult<BatchLedger> {
    let row = sqlx::query_as::<_, BatchRow>(
        r#"
        SELECT id, product_id, batch_number, quantity, expiration_date,
               warning_days_before_expiration, notification_enabled, is_active,
               created_at, updated_at
        FROM batches
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(batch_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| InventoryError::not_found("Batch"))?;

    tracing::debug!(%batch_id, "Locked batch for ledger update");

    let stocks = fetch_batch_stocks(conn, batch_id).await?;
    Ok(BatchLedger::new(row.into(), stocks))
}

/// Write the row changes recorded by a ledger, in order
pub async fn persist_changes(conn: &mut PgConnection, changes: Vec<LedgerChange>) -> AppResult<()> {
    for change in changes {
        match change {
            LedgerChange::Inserted(stock) => {
                sqlx::query(
                    r#"
                    INSERT INTO branch_stocks (
                        id, branch_id, product_id, batch_id, quantity, minimum_stock,
                        created_at, updated_at
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(stock.id)
                .bind(stock.branch_id)
                .bind(stock.product_id)
                .bind(stock.batch_id)
                .bind(stock.quantity)
                .bind(stock.minimum_stock)
                .bind(stock.created_at)
                .bind(stock.updated_at)
                .execute(&mut *conn)
                .await?;
            }
            LedgerChange::Updated(stock) => {
                sqlx::query(
                    r#"
                    UPDATE branch_stocks
                    SET quantity = $1, minimum_stock = $2, updated_at = $3
                    WHERE id = $4
                    "#,
                )
                .bind(stock.quantity)
                .bind(stock.minimum_stock)
                .bind(stock.updated_at)
                .bind(stock.id)
                .execute(&mut *conn)
                .await?;
            }
            LedgerChange::Deleted(stock_id) => {
                sqlx::query("DELETE FROM branch_stocks WHERE id = $1")
                    .bind(stock_id)
                    .execute(&mut *conn)
                    .await?;
            }
        }
    }

    Ok(())
}

/// Write the mutable fields of a batch
pub async fn save_batch(conn: &mut PgConnection, batch: &Batch) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE batches
        SET batch_number = $1, quantity = $2, expiration_date = $3,
            warning_days_before_expiration = $4, notification_enabled = $5,
            is_active = $6, updated_at = $7
        WHERE id = $8
        "#,
    )
    .bind(&batch.batch_number)
    .bind(batch.quantity)
    .bind(batch.expiration_date)
    .bind(batch.warning_days_before_expiration)
    .bind(batch.notification_enabled)
    .bind(batch.active)
    .bind(batch.updated_at)
    .bind(batch.id)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        crate::error::unique_violation(e, "batch_number", "an active batch with this number already exists")
    })?;

    Ok(())
}

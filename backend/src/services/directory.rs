//! Read-only checks against products and branches
//!
//! Lookups take a connection so they can run inside a caller's transaction.
//! A service holding a batch lock must never go back to the pool.

use shared::{Branch, InventoryError, Product};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{BranchRow, ProductRow};

/// Existence and active-flag lookups for externally owned records
#[derive(Clone)]
pub struct DirectoryService {
    db: PgPool,
}

impl DirectoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get a product by id
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        let mut conn = self.db.acquire().await?;
        fetch_product(&mut conn, product_id).await
    }

    /// Get a product that batches may be registered for
    pub async fn require_active_product(&self, product_id: Uuid) -> AppResult<Product> {
        let product = self.get_product(product_id).await?;
        product.ensure_active()?;
        Ok(product)
    }

    /// Get a branch by id
    pub async fn get_branch(&self, branch_id: Uuid) -> AppResult<Branch> {
        let mut conn = self.db.acquire().await?;
        fetch_branch(&mut conn, branch_id).await
    }
}

/// Read a product on the given connection
pub async fn fetch_product(conn: &mut PgConnection, product_id: Uuid) -> AppResult<Product> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, sku, name, brand, unit, unit_price, is_active FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| InventoryError::not_found("Product"))?;

    Ok(row.into())
}

/// Read a branch on the given connection
pub async fn fetch_branch(conn: &mut PgConnection, branch_id: Uuid) -> AppResult<Branch> {
    let row = sqlx::query_as::<_, BranchRow>(
        "SELECT id, name, is_active FROM branches WHERE id = $1",
    )
    .bind(branch_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| InventoryError::not_found("Branch"))?;

    Ok(row.into())
}

/// Get a branch that may receive stock; `field` names the input it came from
pub async fn require_active_branch(
    conn: &mut PgConnection,
    branch_id: Uuid,
    field: &str,
) -> AppResult<Branch> {
    let branch = fetch_branch(conn, branch_id).await?;
    branch.ensure_active(field)?;
    Ok(branch)
}

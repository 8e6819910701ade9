//! Per-batch allocation ledger
//!
//! A `BatchLedger` holds one batch together with every branch stock row drawn
//! from it. All operations that read-then-write the batch-wide total go through
//! it, so the conservation rule (allocated units never exceed the batch
//! quantity) is checked against a freshly summed aggregate rather than a stored
//! counter.
//!
//! The ledger is storage-agnostic. Callers load it under whatever per-batch
//! serialization their store offers (the backend takes a row lock on the batch),
//! run operations, then persist the recorded [`LedgerChange`]s in the same unit
//! of work. Every operation validates fully before it mutates, so an `Err`
//! leaves both the rows and the change log untouched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InventoryError, InventoryResult};
use crate::models::{AllocationRequest, Batch, BatchUpdate, BranchStock};
use crate::validation::{validate_non_negative, validate_positive_quantity};

/// A row-level change produced by a ledger operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerChange {
    Inserted(BranchStock),
    Updated(BranchStock),
    Deleted(Uuid),
}

/// Allocation totals for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub batch_id: Uuid,
    pub quantity: i32,
    pub allocated: i64,
    /// Clamped to zero when rows exceed the batch quantity
    pub available: i32,
}

/// Request to move units from one branch grant to another branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub source_stock_id: Uuid,
    pub target_branch_id: Uuid,
    pub quantity: i32,
}

/// A transfer that passed validation against a ledger
///
/// Only [`BatchLedger::validate_transfer`] can build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransfer {
    batch_id: Uuid,
    source_stock_id: Uuid,
    source_branch_id: Uuid,
    target_branch_id: Uuid,
    quantity: i32,
}

impl ValidatedTransfer {
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    pub fn source_branch_id(&self) -> Uuid {
        self.source_branch_id
    }

    pub fn target_branch_id(&self) -> Uuid {
        self.target_branch_id
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }
}

/// Both sides of an applied transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub batch_id: Uuid,
    pub quantity: i32,
    /// Source row after the move; quantity 0 when it was released
    pub source: BranchStock,
    pub source_released: bool,
    pub target: BranchStock,
    pub target_created: bool,
}

/// One batch and all branch stock rows drawn from it
#[derive(Debug, Clone)]
pub struct BatchLedger {
    batch: Batch,
    stocks: Vec<BranchStock>,
    changes: Vec<LedgerChange>,
}

impl BatchLedger {
    /// Build a ledger; rows for other batches are ignored
    pub fn new(batch: Batch, stocks: Vec<BranchStock>) -> Self {
        let mut stocks: Vec<BranchStock> = stocks
            .into_iter()
            .filter(|s| s.batch_id == batch.id)
            .collect();
        stocks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Self {
            batch,
            stocks,
            changes: Vec::new(),
        }
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Rows in grant order (oldest first)
    pub fn stocks(&self) -> &[BranchStock] {
        &self.stocks
    }

    pub fn stock(&self, stock_id: Uuid) -> Option<&BranchStock> {
        self.stocks.iter().find(|s| s.id == stock_id)
    }

    /// Sum of all grants for this batch
    pub fn allocated(&self) -> i64 {
        self.stocks.iter().map(|s| i64::from(s.quantity)).sum()
    }

    /// Units still free to allocate, never negative
    pub fn available(&self) -> i32 {
        let free = i64::from(self.batch.quantity) - self.allocated();
        i32::try_from(free.max(0)).unwrap_or(i32::MAX)
    }

    pub fn availability(&self) -> Availability {
        Availability {
            batch_id: self.batch.id,
            quantity: self.batch.quantity,
            allocated: self.allocated(),
            available: self.available(),
        }
    }

    /// Rows already exceed the batch quantity (only possible via outside edits)
    pub fn is_over_allocated(&self) -> bool {
        self.allocated() > i64::from(self.batch.quantity)
    }

    /// Total a branch holds of this batch across its grants
    pub fn holding(&self, branch_id: Uuid) -> i64 {
        self.stocks
            .iter()
            .filter(|s| s.branch_id == branch_id)
            .map(|s| i64::from(s.quantity))
            .sum()
    }

    /// Drain the change log for persistence
    pub fn take_changes(&mut self) -> Vec<LedgerChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    fn ensure_consistent(&self) -> InventoryResult<()> {
        if self.is_over_allocated() {
            return Err(InventoryError::AllocationConflict(format!(
                "batch {} has {} units allocated but only {} received",
                self.batch.id,
                self.allocated(),
                self.batch.quantity
            )));
        }
        Ok(())
    }

    fn position(&self, stock_id: Uuid) -> InventoryResult<usize> {
        self.stocks
            .iter()
            .position(|s| s.id == stock_id)
            .ok_or_else(|| InventoryError::not_found("Branch stock"))
    }

    fn remove_at(&mut self, index: usize) -> BranchStock {
        let stock = self.stocks.remove(index);
        self.changes.push(LedgerChange::Deleted(stock.id));
        stock
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Grant part of the batch to a branch as a new row
    ///
    /// Grants are append-only: an existing row for the same branch is never
    /// merged into.
    pub fn allocate(
        &mut self,
        request: &AllocationRequest,
        as_of: NaiveDate,
        stock_id: Uuid,
        now: DateTime<Utc>,
    ) -> InventoryResult<BranchStock> {
        validate_positive_quantity("quantity", request.quantity)?;
        validate_non_negative("minimum_stock", request.minimum_stock)?;

        if request.batch_id != self.batch.id {
            return Err(InventoryError::not_found("Batch"));
        }
        if !self.batch.accepts_allocations(as_of) {
            return Err(InventoryError::BatchNotActive(self.batch.id));
        }
        self.ensure_consistent()?;

        let available = self.available();
        if request.quantity > available {
            return Err(InventoryError::InsufficientBatchQuantity {
                requested: request.quantity,
                available,
            });
        }

        let stock = BranchStock {
            id: stock_id,
            branch_id: request.branch_id,
            product_id: self.batch.product_id,
            batch_id: self.batch.id,
            quantity: request.quantity,
            minimum_stock: request.minimum_stock,
            created_at: now,
            updated_at: now,
        };
        self.stocks.push(stock.clone());
        self.changes.push(LedgerChange::Inserted(stock.clone()));

        Ok(stock)
    }

    /// Set a row's quantity directly, e.g. after a physical count
    ///
    /// Raising is checked against every other row of the batch. Setting the
    /// quantity to zero removes the row.
    pub fn adjust(
        &mut self,
        stock_id: Uuid,
        new_quantity: i32,
        now: DateTime<Utc>,
    ) -> InventoryResult<BranchStock> {
        let index = self.position(stock_id)?;
        validate_non_negative("quantity", new_quantity)?;

        let current = self.stocks[index].quantity;
        if new_quantity > current {
            self.ensure_consistent()?;
            let others = self.allocated() - i64::from(current);
            if others + i64::from(new_quantity) > i64::from(self.batch.quantity) {
                let available = i64::from(self.batch.quantity) - others;
                return Err(InventoryError::InsufficientBatchQuantity {
                    requested: new_quantity,
                    available: i32::try_from(available.max(0)).unwrap_or(i32::MAX),
                });
            }
        }

        if new_quantity == 0 {
            let mut removed = self.remove_at(index);
            removed.quantity = 0;
            removed.updated_at = now;
            return Ok(removed);
        }

        let stock = &mut self.stocks[index];
        stock.quantity = new_quantity;
        stock.updated_at = now;
        let updated = stock.clone();
        self.changes.push(LedgerChange::Updated(updated.clone()));

        Ok(updated)
    }

    /// Change the low-stock threshold of a row
    pub fn set_minimum_stock(
        &mut self,
        stock_id: Uuid,
        minimum_stock: i32,
        now: DateTime<Utc>,
    ) -> InventoryResult<BranchStock> {
        let index = self.position(stock_id)?;
        validate_non_negative("minimum_stock", minimum_stock)?;

        let stock = &mut self.stocks[index];
        stock.minimum_stock = minimum_stock;
        stock.updated_at = now;
        let updated = stock.clone();
        self.changes.push(LedgerChange::Updated(updated.clone()));

        Ok(updated)
    }

    /// Delete a row; its units return to the available pool
    pub fn release(&mut self, stock_id: Uuid) -> InventoryResult<BranchStock> {
        let index = self.position(stock_id)?;
        Ok(self.remove_at(index))
    }

    /// Update batch fields, refusing to shrink below what is allocated
    pub fn update_batch(&mut self, update: &BatchUpdate, now: DateTime<Utc>) -> InventoryResult<&Batch> {
        let allocated = self.allocated();
        self.batch.apply_update(update, allocated, now)?;
        Ok(&self.batch)
    }

    // ========================================================================
    // Transfer
    // ========================================================================

    /// Check a transfer request; the first failing rule wins
    ///
    /// Order: unknown source, non-positive quantity, quantity above the
    /// source's holding, same branch, inactive batch.
    pub fn validate_transfer(&self, request: &TransferRequest) -> InventoryResult<ValidatedTransfer> {
        let source = self
            .stock(request.source_stock_id)
            .ok_or_else(|| InventoryError::not_found("Branch stock"))?;

        validate_positive_quantity("quantity", request.quantity)?;

        if request.quantity > source.quantity {
            return Err(InventoryError::InsufficientStock {
                requested: request.quantity,
                on_hand: source.quantity,
            });
        }
        if request.target_branch_id == source.branch_id {
            return Err(InventoryError::SameBranch);
        }
        if !self.batch.active {
            return Err(InventoryError::BatchNotActive(self.batch.id));
        }

        Ok(ValidatedTransfer {
            batch_id: self.batch.id,
            source_stock_id: source.id,
            source_branch_id: source.branch_id,
            target_branch_id: request.target_branch_id,
            quantity: request.quantity,
        })
    }

    /// Apply a validated transfer to both rows at once
    ///
    /// The source and destination are resolved before anything is written. If
    /// the ledger moved on since validation (source gone or drained), the
    /// transfer is rejected with nothing changed.
    pub fn apply_transfer(
        &mut self,
        transfer: ValidatedTransfer,
        new_stock_id: Uuid,
        now: DateTime<Utc>,
    ) -> InventoryResult<TransferOutcome> {
        if transfer.batch_id != self.batch.id {
            return Err(InventoryError::not_found("Batch"));
        }
        let source_index = self.position(transfer.source_stock_id)?;
        let on_hand = self.stocks[source_index].quantity;
        if transfer.quantity > on_hand {
            return Err(InventoryError::InsufficientStock {
                requested: transfer.quantity,
                on_hand,
            });
        }
        let target_index = self
            .stocks
            .iter()
            .position(|s| s.branch_id == transfer.target_branch_id);

        // credit destination
        let (target, target_created) = match target_index {
            Some(index) => {
                let stock = &mut self.stocks[index];
                stock.quantity += transfer.quantity;
                stock.updated_at = now;
                let updated = stock.clone();
                self.changes.push(LedgerChange::Updated(updated.clone()));
                (updated, false)
            }
            None => {
                let created = BranchStock {
                    id: new_stock_id,
                    branch_id: transfer.target_branch_id,
                    product_id: self.batch.product_id,
                    batch_id: self.batch.id,
                    quantity: transfer.quantity,
                    minimum_stock: 0,
                    created_at: now,
                    updated_at: now,
                };
                self.stocks.push(created.clone());
                self.changes.push(LedgerChange::Inserted(created.clone()));
                (created, true)
            }
        };

        // debit source; the push above never moves rows before it
        let source_stock = &mut self.stocks[source_index];
        source_stock.quantity -= transfer.quantity;
        source_stock.updated_at = now;
        let source = source_stock.clone();
        let source_released = source.quantity == 0;
        if source_released {
            self.remove_at(source_index);
        } else {
            self.changes.push(LedgerChange::Updated(source.clone()));
        }

        Ok(TransferOutcome {
            batch_id: self.batch.id,
            quantity: transfer.quantity,
            source,
            source_released,
            target,
            target_created,
        })
    }

    /// Validate and apply in one step
    pub fn transfer(
        &mut self,
        request: &TransferRequest,
        new_stock_id: Uuid,
        now: DateTime<Utc>,
    ) -> InventoryResult<TransferOutcome> {
        let validated = self.validate_transfer(request)?;
        self.apply_transfer(validated, new_stock_id, now)
    }
}

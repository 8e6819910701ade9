//! Batch models and time-derived batch state

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InventoryError, InventoryResult};
use crate::validation::{
    validate_batch_number, validate_future_expiration, validate_non_negative,
    validate_positive_quantity, validate_warning_days,
};

/// Warning window used when a batch is registered without one
pub const DEFAULT_WARNING_DAYS: i32 = 7;

/// A dated, finite-quantity lot of one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub product_id: Uuid,
    pub batch_number: String,
    /// Total units received; the ceiling for branch allocations
    pub quantity: i32,
    pub expiration_date: NaiveDate,
    pub warning_days_before_expiration: i32,
    pub notification_enabled: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Time-derived state of a batch as of a calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchState {
    pub expired: bool,
    pub expiring_soon: bool,
    /// Negative once the batch has expired
    pub days_until_expiration: i64,
}

/// Compute expired / expiring-soon for a batch on a given date
///
/// Day granularity: a batch expiring today is still usable today and becomes
/// expired tomorrow.
pub fn compute_state(batch: &Batch, as_of: NaiveDate) -> BatchState {
    let days_until_expiration = (batch.expiration_date - as_of).num_days();
    let expired = as_of > batch.expiration_date;
    let expiring_soon =
        !expired && days_until_expiration <= i64::from(batch.warning_days_before_expiration);

    BatchState {
        expired,
        expiring_soon,
        days_until_expiration,
    }
}

impl Batch {
    pub fn state(&self, as_of: NaiveDate) -> BatchState {
        compute_state(self, as_of)
    }

    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.state(as_of).expired
    }

    /// Whether new allocations may be drawn from this batch
    pub fn accepts_allocations(&self, as_of: NaiveDate) -> bool {
        self.active && !self.is_expired(as_of)
    }

    /// Apply a partial update, given the quantity already allocated to branches
    ///
    /// All fields are validated before any is written, so a rejected update
    /// leaves the batch untouched.
    pub fn apply_update(
        &mut self,
        update: &BatchUpdate,
        allocated: i64,
        now: DateTime<Utc>,
    ) -> InventoryResult<()> {
        if let Some(batch_number) = &update.batch_number {
            validate_batch_number(batch_number)?;
        }
        if let Some(quantity) = update.quantity {
            validate_non_negative("quantity", quantity)?;
            if i64::from(quantity) < allocated {
                return Err(InventoryError::AllocationConflict(format!(
                    "quantity {} is below the {} units already allocated to branches",
                    quantity, allocated
                )));
            }
        }
        if let Some(days) = update.warning_days_before_expiration {
            validate_warning_days(days)?;
        }

        if let Some(batch_number) = &update.batch_number {
            self.batch_number = batch_number.trim().to_string();
        }
        if let Some(quantity) = update.quantity {
            self.quantity = quantity;
        }
        if let Some(expiration_date) = update.expiration_date {
            self.expiration_date = expiration_date;
        }
        if let Some(days) = update.warning_days_before_expiration {
            self.warning_days_before_expiration = days;
        }
        if let Some(enabled) = update.notification_enabled {
            self.notification_enabled = enabled;
        }
        self.updated_at = now;

        Ok(())
    }
}

/// Input for registering an inbound batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBatch {
    pub product_id: Uuid,
    pub batch_number: String,
    pub quantity: i32,
    pub expiration_date: NaiveDate,
    pub warning_days_before_expiration: Option<i32>,
    pub notification_enabled: Option<bool>,
}

impl NewBatch {
    /// Validate the registration against the receiving date
    pub fn validate(&self, today: NaiveDate) -> InventoryResult<()> {
        validate_batch_number(&self.batch_number)?;
        validate_positive_quantity("quantity", self.quantity)?;
        validate_future_expiration(self.expiration_date, today)?;
        if let Some(days) = self.warning_days_before_expiration {
            validate_warning_days(days)?;
        }
        Ok(())
    }

    /// Build the batch record, filling defaults
    pub fn into_batch(self, id: Uuid, now: DateTime<Utc>) -> Batch {
        Batch {
            id,
            product_id: self.product_id,
            batch_number: self.batch_number.trim().to_string(),
            quantity: self.quantity,
            expiration_date: self.expiration_date,
            warning_days_before_expiration: self
                .warning_days_before_expiration
                .unwrap_or(DEFAULT_WARNING_DAYS),
            notification_enabled: self.notification_enabled.unwrap_or(true),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchUpdate {
    pub batch_number: Option<String>,
    pub quantity: Option<i32>,
    pub expiration_date: Option<NaiveDate>,
    pub warning_days_before_expiration: Option<i32>,
    pub notification_enabled: Option<bool>,
}

/// Batch with its derived state, as returned to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchView {
    #[serde(flatten)]
    pub batch: Batch,
    pub expired: bool,
    pub expiring_soon: bool,
    pub days_until_expiration: i64,
}

impl BatchView {
    pub fn new(batch: Batch, as_of: NaiveDate) -> Self {
        let state = batch.state(as_of);
        Self {
            batch,
            expired: state.expired,
            expiring_soon: state.expiring_soon,
            days_until_expiration: state.days_until_expiration,
        }
    }
}

/// Batches that are active and inside their warning window
pub fn filter_expiring_soon(batches: &[Batch], as_of: NaiveDate) -> Vec<Batch> {
    batches
        .iter()
        .filter(|b| b.active && b.state(as_of).expiring_soon)
        .cloned()
        .collect()
}

/// Batches past their expiration date, active or not
pub fn filter_expired(batches: &[Batch], as_of: NaiveDate) -> Vec<Batch> {
    batches
        .iter()
        .filter(|b| b.is_expired(as_of))
        .cloned()
        .collect()
}

/// Deactivate every active batch that has expired; returns how many changed
///
/// Running it again on the same date changes nothing.
pub fn deactivate_expired(batches: &mut [Batch], as_of: NaiveDate, now: DateTime<Utc>) -> usize {
    let mut count = 0;
    for batch in batches.iter_mut() {
        if batch.active && batch.is_expired(as_of) {
            batch.active = false;
            batch.updated_at = now;
            count += 1;
        }
    }
    count
}

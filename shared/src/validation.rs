//! Input validation for batch and allocation operations

use chrono::NaiveDate;

use crate::error::{InventoryError, InventoryResult};

/// Longest batch number accepted
pub const MAX_BATCH_NUMBER_LEN: usize = 64;

/// Validate a quantity that must be strictly positive
pub fn validate_positive_quantity(field: &str, quantity: i32) -> InventoryResult<()> {
    if quantity <= 0 {
        return Err(InventoryError::invalid(field, "must be greater than zero"));
    }
    Ok(())
}

/// Validate a quantity or threshold that may be zero
pub fn validate_non_negative(field: &str, value: i32) -> InventoryResult<()> {
    if value < 0 {
        return Err(InventoryError::invalid(field, "cannot be negative"));
    }
    Ok(())
}

/// Validate the expiration warning window (at least one day)
pub fn validate_warning_days(days: i32) -> InventoryResult<()> {
    if days < 1 {
        return Err(InventoryError::invalid(
            "warning_days_before_expiration",
            "must be at least 1 day",
        ));
    }
    Ok(())
}

/// Validate a caller-supplied batch number
pub fn validate_batch_number(batch_number: &str) -> InventoryResult<()> {
    let trimmed = batch_number.trim();
    if trimmed.is_empty() {
        return Err(InventoryError::invalid("batch_number", "cannot be blank"));
    }
    if trimmed.len() > MAX_BATCH_NUMBER_LEN {
        return Err(InventoryError::invalid(
            "batch_number",
            format!("must be at most {} characters", MAX_BATCH_NUMBER_LEN),
        ));
    }
    Ok(())
}

/// Validate that an expiration date lies strictly after today
pub fn validate_future_expiration(expiration_date: NaiveDate, today: NaiveDate) -> InventoryResult<()> {
    if expiration_date <= today {
        return Err(InventoryError::invalid(
            "expiration_date",
            "must be after the receiving date",
        ));
    }
    Ok(())
}

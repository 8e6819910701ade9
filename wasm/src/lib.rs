//! WebAssembly module for the branch batch inventory dashboard
//!
//! Provides client-side computation for:
//! - Batch expiration state
//! - Low-stock flags
//! - Units available to allocate
//! - Expiration notifications
//! - Offline validation of new batches
//!
//! Inputs and outputs are JSON strings; dates are `YYYY-MM-DD`.

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

use shared::{BatchLedger, InventoryError};

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    value
        .parse::<NaiveDate>()
        .map_err(|e| format!("Invalid date '{}': {}", value, e))
}

fn parse_json<T: serde::de::DeserializeOwned>(what: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn batch_state_json(batch_json: &str, as_of: &str) -> Result<String, String> {
    let batch: Batch = parse_json("batch", batch_json)?;
    let as_of = parse_date(as_of)?;
    to_json(&compute_state(&batch, as_of))
}

fn available_units(batch_json: &str, stocks_json: &str) -> Result<i32, String> {
    let batch: Batch = parse_json("batch", batch_json)?;
    let stocks: Vec<BranchStock> = parse_json("stocks", stocks_json)?;
    Ok(BatchLedger::new(batch, stocks).available())
}

fn notifications_json(batches_json: &str, as_of: &str) -> Result<String, String> {
    let batches: Vec<Batch> = parse_json("batches", batches_json)?;
    let as_of = parse_date(as_of)?;
    to_json(&shared::expiring_notifications(&batches, as_of))
}

fn new_batch_errors(input_json: &str, today: &str) -> Result<Option<InventoryError>, String> {
    let input: NewBatch = parse_json("batch", input_json)?;
    let today = parse_date(today)?;
    Ok(input.validate(today).err())
}

/// Expired / expiring-soon state of a batch as of a date
#[wasm_bindgen]
pub fn compute_batch_state(batch_json: &str, as_of: &str) -> Result<String, JsValue> {
    batch_state_json(batch_json, as_of).map_err(|e| JsValue::from_str(&e))
}

/// Whether a branch stock row is at or below its minimum
#[wasm_bindgen]
pub fn is_low_stock(quantity: i32, minimum_stock: i32) -> bool {
    shared::is_low_stock(quantity, minimum_stock)
}

/// Units of a batch not yet granted to the given stock rows
#[wasm_bindgen]
pub fn available_to_allocate(batch_json: &str, stocks_json: &str) -> Result<i32, JsValue> {
    available_units(batch_json, stocks_json).map_err(|e| JsValue::from_str(&e))
}

/// Expiration notifications for a list of batches
#[wasm_bindgen]
pub fn expiring_notifications(batches_json: &str, as_of: &str) -> Result<String, JsValue> {
    notifications_json(batches_json, as_of).map_err(|e| JsValue::from_str(&e))
}

/// Validate a batch registration offline; returns the error as JSON, or an
/// empty string when the input is acceptable
#[wasm_bindgen]
pub fn validate_new_batch(input_json: &str, today: &str) -> Result<String, JsValue> {
    match new_batch_errors(input_json, today).map_err(|e| JsValue::from_str(&e))? {
        Some(err) => to_json(&err).map_err(|e| JsValue::from_str(&e)),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch_json(expiration_date: &str, quantity: i32) -> serde_json::Value {
        json!({
            "id": "7f9c2b1e-0000-4000-8000-000000000001",
            "product_id": "7f9c2b1e-0000-4000-8000-000000000002",
            "batch_number": "CHEESE-01",
            "quantity": quantity,
            "expiration_date": expiration_date,
            "warning_days_before_expiration": 7,
            "notification_enabled": true,
            "active": true,
            "created_at": "2025-05-01T08:00:00Z",
            "updated_at": "2025-05-01T08:00:00Z"
        })
    }

    #[test]
    fn test_batch_state() {
        let batch = batch_json("2025-06-05", 100).to_string();

        let state: BatchState =
            serde_json::from_str(&batch_state_json(&batch, "2025-06-01").unwrap()).unwrap();
        assert!(state.expiring_soon);
        assert_eq!(state.days_until_expiration, 4);

        let state: BatchState =
            serde_json::from_str(&batch_state_json(&batch, "2025-06-06").unwrap()).unwrap();
        assert!(state.expired);
    }

    #[test]
    fn test_bad_date_rejected() {
        let batch = batch_json("2025-06-05", 100).to_string();
        assert!(batch_state_json(&batch, "06/01/2025").is_err());
    }

    #[test]
    fn test_is_low_stock() {
        assert!(is_low_stock(10, 10));
        assert!(is_low_stock(3, 10));
        assert!(!is_low_stock(11, 10));
    }

    #[test]
    fn test_low_stock_matches_stock_view() {
        for (quantity, minimum_stock) in [(0, 0), (4, 5), (5, 5), (6, 5), (1, 0)] {
            let stock: BranchStock = serde_json::from_value(json!({
                "id": "7f9c2b1e-0000-4000-8000-000000000010",
                "branch_id": "7f9c2b1e-0000-4000-8000-000000000020",
                "product_id": "7f9c2b1e-0000-4000-8000-000000000002",
                "batch_id": "7f9c2b1e-0000-4000-8000-000000000001",
                "quantity": quantity,
                "minimum_stock": minimum_stock,
                "created_at": "2025-05-02T08:00:00Z",
                "updated_at": "2025-05-02T08:00:00Z"
            }))
            .unwrap();

            let view = BranchStockView::from(stock);
            assert_eq!(is_low_stock(quantity, minimum_stock), view.low_stock);
        }
    }

    #[test]
    fn test_available_units() {
        let batch = batch_json("2025-06-30", 100);
        let stocks = json!([
            {
                "id": "7f9c2b1e-0000-4000-8000-000000000010",
                "branch_id": "7f9c2b1e-0000-4000-8000-000000000020",
                "product_id": "7f9c2b1e-0000-4000-8000-000000000002",
                "batch_id": "7f9c2b1e-0000-4000-8000-000000000001",
                "quantity": 60,
                "minimum_stock": 10,
                "created_at": "2025-05-02T08:00:00Z",
                "updated_at": "2025-05-02T08:00:00Z"
            }
        ]);

        assert_eq!(
            available_units(&batch.to_string(), &stocks.to_string()).unwrap(),
            40
        );
        assert_eq!(available_units(&batch.to_string(), "[]").unwrap(), 100);
    }

    #[test]
    fn test_notifications() {
        let batches = json!([batch_json("2025-06-03", 50), batch_json("2025-07-30", 50)]);

        let out: Vec<ExpiringNotification> = serde_json::from_str(
            &notifications_json(&batches.to_string(), "2025-06-01").unwrap(),
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].days_until_expiration, 2);
    }

    #[test]
    fn test_new_batch_validation() {
        let input = json!({
            "product_id": "7f9c2b1e-0000-4000-8000-000000000002",
            "batch_number": "CHEESE-02",
            "quantity": 0,
            "expiration_date": "2025-07-01"
        })
        .to_string();

        let err = new_batch_errors(&input, "2025-06-01").unwrap().unwrap();
        assert_eq!(err.field(), Some("quantity"));
    }
}

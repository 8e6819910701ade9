//! Expiration notifications derived from batch state

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Batch, BranchStock, BranchStockView};

/// A batch inside its warning window with notifications enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiringNotification {
    pub batch_id: Uuid,
    pub batch_number: String,
    pub product_id: Uuid,
    pub expiration_date: NaiveDate,
    /// Zero on the expiration day itself, never negative
    pub days_until_expiration: i64,
    pub quantity: i32,
    pub notification_enabled: bool,
}

/// Notification paired with the branch allocations it affects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringStockAlert {
    #[serde(flatten)]
    pub notification: ExpiringNotification,
    pub allocated_quantity: i64,
    pub allocations: Vec<BranchStockView>,
}

/// Derive expiration warnings for the given batches
///
/// Only active, notification-enabled batches that are expiring soon (and
/// therefore not expired) are reported. Ordered by days remaining, then batch
/// number.
pub fn expiring_notifications(batches: &[Batch], as_of: NaiveDate) -> Vec<ExpiringNotification> {
    let mut notifications: Vec<ExpiringNotification> = batches
        .iter()
        .filter(|b| b.active && b.notification_enabled)
        .filter_map(|b| {
            let state = b.state(as_of);
            state.expiring_soon.then(|| ExpiringNotification {
                batch_id: b.id,
                batch_number: b.batch_number.clone(),
                product_id: b.product_id,
                expiration_date: b.expiration_date,
                days_until_expiration: state.days_until_expiration,
                quantity: b.quantity,
                notification_enabled: b.notification_enabled,
            })
        })
        .collect();

    notifications.sort_by(|a, b| {
        a.days_until_expiration
            .cmp(&b.days_until_expiration)
            .then_with(|| a.batch_number.cmp(&b.batch_number))
    });
    notifications
}

/// Attach the allocations of each notified batch
pub fn attach_allocations(
    notifications: Vec<ExpiringNotification>,
    stocks: &[BranchStock],
) -> Vec<ExpiringStockAlert> {
    notifications
        .into_iter()
        .map(|notification| {
            let allocations: Vec<BranchStockView> = stocks
                .iter()
                .filter(|s| s.batch_id == notification.batch_id)
                .cloned()
                .map(BranchStockView::from)
                .collect();
            let allocated_quantity = allocations
                .iter()
                .map(|a| i64::from(a.stock.quantity))
                .sum();

            ExpiringStockAlert {
                notification,
                allocated_quantity,
                allocations,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn batch(number: &str, expiration_date: NaiveDate) -> Batch {
        let now = Utc::now();
        Batch {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            batch_number: number.to_string(),
            quantity: 100,
            expiration_date,
            warning_days_before_expiration: 7,
            notification_enabled: true,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ordering_and_ties() {
        let today = date(2025, 8, 1);
        let batches = vec![
            batch("C", today + Duration::days(5)),
            batch("B", today + Duration::days(2)),
            batch("A", today + Duration::days(5)),
            batch("D", today),
        ];

        let numbers: Vec<String> = expiring_notifications(&batches, today)
            .into_iter()
            .map(|n| n.batch_number)
            .collect();
        assert_eq!(numbers, vec!["D", "B", "A", "C"]);
    }

    #[test]
    fn test_excludes_expired_disabled_and_inactive() {
        let today = date(2025, 8, 1);
        let mut disabled = batch("disabled", today + Duration::days(1));
        disabled.notification_enabled = false;
        let mut retired = batch("retired", today + Duration::days(1));
        retired.active = false;
        let batches = vec![
            batch("expired", today - Duration::days(1)),
            batch("far", today + Duration::days(30)),
            disabled,
            retired,
            batch("due", today),
        ];

        let notifications = expiring_notifications(&batches, today);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].batch_number, "due");
        assert_eq!(notifications[0].days_until_expiration, 0);
    }

    #[test]
    fn test_attach_allocations() {
        let today = date(2025, 8, 1);
        let b = batch("A", today + Duration::days(3));
        let now = Utc::now();
        let stocks: Vec<BranchStock> = [30, 12]
            .iter()
            .map(|q| BranchStock {
                id: Uuid::new_v4(),
                branch_id: Uuid::new_v4(),
                product_id: b.product_id,
                batch_id: b.id,
                quantity: *q,
                minimum_stock: 15,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let alerts = attach_allocations(expiring_notifications(&[b], today), &stocks);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].allocated_quantity, 42);
        assert_eq!(alerts[0].allocations.len(), 2);
        assert!(alerts[0].allocations[1].low_stock);
    }
}

//! Batch expiration and notification tests
//!
//! Tests for time-derived batch state including:
//! - Property 6: Expired and expiring-soon are mutually exclusive
//! - Property 7: The expiration sweep is idempotent
//! - Property 8: Notifications only cover active, enabled, expiring batches

use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;
use shared::{
    attach_allocations, compute_state, deactivate_expired, expiring_notifications, filter_expired,
    filter_expiring_soon, Batch, BatchView, BranchStock,
};
use uuid::Uuid;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn batch(number: &str, days_left: i64, warning_days: i32) -> Batch {
    let now = Utc::now();
    Batch {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        batch_number: number.to_string(),
        quantity: 100,
        expiration_date: today() + Duration::days(days_left),
        warning_days_before_expiration: warning_days,
        notification_enabled: true,
        active: true,
        created_at: now,
        updated_at: now,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Warning window opens as the date approaches
    #[test]
    fn test_warning_window_opens() {
        let b = batch("B-1", 10, 7);

        let state = compute_state(&b, today());
        assert!(!state.expiring_soon);
        assert!(!state.expired);
        assert_eq!(state.days_until_expiration, 10);

        let later = compute_state(&b, today() + Duration::days(5));
        assert!(later.expiring_soon);
        assert_eq!(later.days_until_expiration, 5);
    }

    /// Expiration day is still usable; the next day is expired
    #[test]
    fn test_expiration_day_boundary() {
        let b = batch("B-1", 0, 7);

        let on_day = compute_state(&b, today());
        assert!(!on_day.expired);
        assert!(on_day.expiring_soon);
        assert_eq!(on_day.days_until_expiration, 0);

        let after = compute_state(&b, today() + Duration::days(1));
        assert!(after.expired);
        assert!(!after.expiring_soon);
        assert_eq!(after.days_until_expiration, -1);
    }

    /// A one-day window warns on the eve and the day itself
    #[test]
    fn test_one_day_window() {
        let b = batch("B-1", 2, 1);
        assert!(!b.state(today()).expiring_soon);
        assert!(b.state(today() + Duration::days(1)).expiring_soon);
        assert!(b.state(today() + Duration::days(2)).expiring_soon);
        assert!(!b.state(today() + Duration::days(3)).expiring_soon);
    }

    /// View carries the derived flags alongside the batch
    #[test]
    fn test_batch_view_flags() {
        let view = BatchView::new(batch("B-1", 3, 7), today());
        assert!(view.expiring_soon);
        assert!(!view.expired);
        assert_eq!(view.days_until_expiration, 3);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["batch_number"], "B-1");
        assert_eq!(json["expiring_soon"], true);
    }

    /// Sweep deactivates expired batches once
    #[test]
    fn test_sweep_idempotent() {
        let mut batches = vec![batch("OLD", -2, 7), batch("EDGE", 0, 7), batch("NEW", 30, 7)];

        assert_eq!(deactivate_expired(&mut batches, today(), Utc::now()), 1);
        assert!(!batches[0].active);
        assert!(batches[1].active);
        assert!(batches[2].active);

        assert_eq!(deactivate_expired(&mut batches, today(), Utc::now()), 0);
    }

    /// Expired filter includes retired batches; expiring filter skips them
    #[test]
    fn test_read_filters() {
        let mut retired = batch("RETIRED", 2, 7);
        retired.active = false;
        let batches = vec![batch("SOON", 2, 7), retired, batch("GONE", -1, 7)];

        let soon = filter_expiring_soon(&batches, today());
        assert_eq!(soon.len(), 1);
        assert_eq!(soon[0].batch_number, "SOON");

        let expired = filter_expired(&batches, today());
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].batch_number, "GONE");
    }

    /// Notifications skip disabled, inactive and out-of-window batches
    #[test]
    fn test_notification_selection() {
        let mut disabled = batch("DISABLED", 1, 7);
        disabled.notification_enabled = false;
        let mut inactive = batch("INACTIVE", 1, 7);
        inactive.active = false;

        let batches = vec![
            batch("LATER", 30, 7),
            batch("B-2", 3, 7),
            disabled,
            inactive,
            batch("EXPIRED", -1, 7),
            batch("B-1", 3, 7),
            batch("TODAY", 0, 7),
        ];

        let notifications = expiring_notifications(&batches, today());
        let numbers: Vec<&str> = notifications.iter().map(|n| n.batch_number.as_str()).collect();

        assert_eq!(numbers, vec!["TODAY", "B-1", "B-2"]);
        assert_eq!(notifications[0].days_until_expiration, 0);
        assert!(notifications.iter().all(|n| n.notification_enabled));
    }

    /// Expiring stock report totals allocations per notified batch
    #[test]
    fn test_attach_allocations() {
        let soon = batch("SOON", 2, 7);
        let now = Utc::now();
        let stock = |quantity: i32, batch_id: Uuid| BranchStock {
            id: Uuid::new_v4(),
            branch_id: Uuid::new_v4(),
            product_id: soon.product_id,
            batch_id,
            quantity,
            minimum_stock: 5,
            created_at: now,
            updated_at: now,
        };
        let stocks = vec![stock(30, soon.id), stock(4, soon.id), stock(50, Uuid::new_v4())];

        let alerts = attach_allocations(expiring_notifications(&[soon.clone()], today()), &stocks);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].allocated_quantity, 34);
        assert_eq!(alerts[0].allocations.len(), 2);
        assert!(alerts[0].allocations[1].low_stock);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property 6: Expired and expiring-soon are mutually exclusive
        #[test]
        fn prop_states_exclusive(
            days_left in -60i64..=60,
            warning_days in 1i32..=30
        ) {
            let state = compute_state(&batch("P", days_left, warning_days), today());

            prop_assert!(!(state.expired && state.expiring_soon));
            prop_assert_eq!(state.expired, days_left < 0);
            prop_assert_eq!(
                state.expiring_soon,
                days_left >= 0 && days_left <= i64::from(warning_days)
            );
        }

        /// Property 7: A second sweep on the same date changes nothing
        #[test]
        fn prop_sweep_idempotent(
            offsets in prop::collection::vec(-30i64..=30, 0..20)
        ) {
            let mut batches: Vec<Batch> = offsets
                .iter()
                .map(|days| batch("P", *days, 7))
                .collect();
            let expected = offsets.iter().filter(|d| **d < 0).count();

            prop_assert_eq!(deactivate_expired(&mut batches, today(), Utc::now()), expected);
            prop_assert_eq!(deactivate_expired(&mut batches, today(), Utc::now()), 0);
            prop_assert!(batches.iter().all(|b| b.active != b.is_expired(today())));
        }

        /// Property 8: Notifications are non-negative and ordered
        #[test]
        fn prop_notifications_ordered(
            offsets in prop::collection::vec((-10i64..=20, any::<bool>()), 0..20)
        ) {
            let batches: Vec<Batch> = offsets
                .iter()
                .enumerate()
                .map(|(i, (days, enabled))| {
                    let mut b = batch(&format!("N-{:02}", i), *days, 7);
                    b.notification_enabled = *enabled;
                    b
                })
                .collect();

            let notifications = expiring_notifications(&batches, today());

            prop_assert!(notifications.iter().all(|n| (0..=7).contains(&n.days_until_expiration)));
            prop_assert!(notifications
                .windows(2)
                .all(|w| w[0].days_until_expiration <= w[1].days_until_expiration));
        }
    }
}

//! Transfer coordinator tests
//!
//! Tests for branch-to-branch transfers including:
//! - Property 4: Transfers preserve the batch-wide allocated total
//! - Property 5: Transfers never leave a negative or zero row behind

use chrono::{Duration, NaiveDate, Utc};
use proptest::prelude::*;
use shared::{
    AllocationRequest, Batch, BatchLedger, BranchStock, InventoryError, LedgerChange,
    TransferRequest,
};
use uuid::Uuid;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn ledger(quantity: i32) -> BatchLedger {
    let now = Utc::now();
    let batch = Batch {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        batch_number: "YOG-0601".to_string(),
        quantity,
        expiration_date: today() + Duration::days(20),
        warning_days_before_expiration: 7,
        notification_enabled: true,
        active: true,
        created_at: now,
        updated_at: now,
    };
    BatchLedger::new(batch, Vec::new())
}

fn grant(ledger: &mut BatchLedger, branch_id: Uuid, quantity: i32) -> BranchStock {
    let request = AllocationRequest {
        branch_id,
        batch_id: ledger.batch().id,
        quantity,
        minimum_stock: 5,
    };
    ledger
        .allocate(&request, today(), Uuid::new_v4(), Utc::now())
        .unwrap()
}

fn move_stock(source: &BranchStock, target_branch_id: Uuid, quantity: i32) -> TransferRequest {
    TransferRequest {
        source_stock_id: source.id,
        target_branch_id,
        quantity,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Transfer to a branch with no row creates one
    #[test]
    fn test_transfer_creates_target_row() {
        let mut ledger = ledger(100);
        let branch_a = Uuid::new_v4();
        let branch_b = Uuid::new_v4();
        let stock_a = grant(&mut ledger, branch_a, 60);

        let outcome = ledger
            .transfer(&move_stock(&stock_a, branch_b, 20), Uuid::new_v4(), Utc::now())
            .unwrap();

        assert_eq!(outcome.source.quantity, 40);
        assert!(!outcome.source_released);
        assert_eq!(outcome.target.branch_id, branch_b);
        assert_eq!(outcome.target.quantity, 20);
        assert_eq!(outcome.target.minimum_stock, 0);
        assert!(outcome.target_created);
        assert_eq!(ledger.allocated(), 60);
    }

    /// Transfer within one branch is rejected
    #[test]
    fn test_same_branch_rejected() {
        let mut ledger = ledger(100);
        let branch_a = Uuid::new_v4();
        let stock_a = grant(&mut ledger, branch_a, 60);
        ledger.take_changes();

        let err = ledger
            .transfer(&move_stock(&stock_a, branch_a, 10), Uuid::new_v4(), Utc::now())
            .unwrap_err();

        assert_eq!(err, InventoryError::SameBranch);
        assert!(!ledger.has_changes());
    }

    /// Validation order: unknown source, quantity, holding, branch, batch
    #[test]
    fn test_validation_order() {
        let mut ledger = ledger(100);
        let branch_a = Uuid::new_v4();
        let stock_a = grant(&mut ledger, branch_a, 30);

        let unknown = TransferRequest {
            source_stock_id: Uuid::new_v4(),
            target_branch_id: branch_a,
            quantity: 0,
        };
        assert!(matches!(
            ledger.validate_transfer(&unknown),
            Err(InventoryError::NotFound(_))
        ));

        let err = ledger
            .validate_transfer(&move_stock(&stock_a, branch_a, 0))
            .unwrap_err();
        assert_eq!(err.field(), Some("quantity"));

        let err = ledger
            .validate_transfer(&move_stock(&stock_a, branch_a, 31))
            .unwrap_err();
        assert_eq!(
            err,
            InventoryError::InsufficientStock {
                requested: 31,
                on_hand: 30
            }
        );

        let err = ledger
            .validate_transfer(&move_stock(&stock_a, branch_a, 30))
            .unwrap_err();
        assert_eq!(err, InventoryError::SameBranch);
    }

    /// Inactive batches cannot move stock; expired but active ones can
    #[test]
    fn test_inactive_batch_rejected() {
        let now = Utc::now();
        let branch_a = Uuid::new_v4();

        let mut expired = ledger(100);
        let stock = grant(&mut expired, branch_a, 10);
        let mut batch = expired.batch().clone();
        batch.expiration_date = today() - Duration::days(3);
        let mut expired = BatchLedger::new(batch.clone(), vec![stock.clone()]);

        assert!(expired
            .transfer(&move_stock(&stock, Uuid::new_v4(), 5), Uuid::new_v4(), now)
            .is_ok());

        batch.active = false;
        let inactive = BatchLedger::new(batch, vec![stock.clone()]);
        let err = inactive
            .validate_transfer(&move_stock(&stock, Uuid::new_v4(), 5))
            .unwrap_err();
        assert!(matches!(err, InventoryError::BatchNotActive(_)));
    }

    /// Draining the source deletes it
    #[test]
    fn test_full_transfer_releases_source() {
        let mut ledger = ledger(100);
        let stock_a = grant(&mut ledger, Uuid::new_v4(), 25);
        let branch_b = Uuid::new_v4();
        ledger.take_changes();

        let outcome = ledger
            .transfer(&move_stock(&stock_a, branch_b, 25), Uuid::new_v4(), Utc::now())
            .unwrap();

        assert!(outcome.source_released);
        assert_eq!(outcome.source.quantity, 0);
        assert!(ledger.stock(stock_a.id).is_none());
        assert_eq!(ledger.stocks().len(), 1);

        let changes = ledger.take_changes();
        assert!(matches!(changes[0], LedgerChange::Inserted(_)));
        assert_eq!(changes[1], LedgerChange::Deleted(stock_a.id));
    }

    /// Destination with several grants receives into the oldest one
    #[test]
    fn test_transfer_credits_oldest_target_row() {
        let mut ledger = ledger(100);
        let branch_a = Uuid::new_v4();
        let branch_b = Uuid::new_v4();
        let source = grant(&mut ledger, branch_a, 40);
        let oldest = grant(&mut ledger, branch_b, 10);
        let newer = grant(&mut ledger, branch_b, 10);

        let outcome = ledger
            .transfer(&move_stock(&source, branch_b, 15), Uuid::new_v4(), Utc::now())
            .unwrap();

        assert!(!outcome.target_created);
        assert_eq!(outcome.target.id, oldest.id);
        assert_eq!(ledger.stock(oldest.id).unwrap().quantity, 25);
        assert_eq!(ledger.stock(newer.id).unwrap().quantity, 10);
        assert_eq!(ledger.holding(branch_b), 35);
    }

    /// A validated transfer is re-checked if the source drained meanwhile
    #[test]
    fn test_stale_validation_rejected() {
        let mut ledger = ledger(100);
        let source = grant(&mut ledger, Uuid::new_v4(), 20);

        let validated = ledger
            .validate_transfer(&move_stock(&source, Uuid::new_v4(), 15))
            .unwrap();
        ledger.adjust(source.id, 10, Utc::now()).unwrap();
        ledger.take_changes();

        let err = ledger
            .apply_transfer(validated, Uuid::new_v4(), Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            InventoryError::InsufficientStock {
                requested: 15,
                on_hand: 10
            }
        );
        assert!(!ledger.has_changes());
    }

    /// The validated transfer exposes what was checked
    #[test]
    fn test_validated_transfer_accessors() {
        let mut ledger = ledger(100);
        let branch_a = Uuid::new_v4();
        let branch_b = Uuid::new_v4();
        let source = grant(&mut ledger, branch_a, 20);

        let validated = ledger
            .validate_transfer(&move_stock(&source, branch_b, 5))
            .unwrap();

        assert_eq!(validated.batch_id(), ledger.batch().id);
        assert_eq!(validated.source_branch_id(), branch_a);
        assert_eq!(validated.target_branch_id(), branch_b);
        assert_eq!(validated.quantity(), 5);
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

        /// Property 4: Transfers preserve the batch-wide allocated total
        #[test]
        fn prop_transfer_preserves_total(
            held in 1i32..=100,
            moves in prop::collection::vec((0usize..3, 0usize..3, 1i32..=60), 1..20)
        ) {
            let mut ledger = ledger(100);
            let branches: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
            grant(&mut ledger, branches[0], held);

            for (from, to, quantity) in moves {
                let source = ledger
                    .stocks()
                    .iter()
                    .find(|s| s.branch_id == branches[from])
                    .cloned();
                if let Some(source) = source {
                    let _ = ledger.transfer(
                        &move_stock(&source, branches[to], quantity),
                        Uuid::new_v4(),
                        Utc::now(),
                    );
                }
                prop_assert_eq!(ledger.allocated(), i64::from(held));
            }
        }

        /// Property 5: No row is left at zero or below
        #[test]
        fn prop_transfer_never_negative(
            held in 1i32..=50,
            quantity in -10i32..=60
        ) {
            let mut ledger = ledger(100);
            let source = grant(&mut ledger, Uuid::new_v4(), held);

            let result = ledger.transfer(
                &move_stock(&source, Uuid::new_v4(), quantity),
                Uuid::new_v4(),
                Utc::now(),
            );

            prop_assert_eq!(result.is_ok(), quantity > 0 && quantity <= held);
            prop_assert!(ledger.stocks().iter().all(|s| s.quantity > 0));
        }
    }
}

//! Distribution submission tests
//!
//! Tests for warehouse shipments including:
//! - Line item validation and merging
//! - Aggregate availability for multi-store shipments
//! - Batch grouping of records, including legacy rows
//! - Status transitions and history pagination

use chrono::{NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    aggregate_requirements, find_shortages, group_into_batches, line_total, merge_line_items,
    search_pattern, validate_store_ids, BatchKey, DistributionRecord, DistributionStatus,
    LineItemInput, PaginatedResponse, Pagination, SubmitStatus,
};
use std::collections::HashMap;
use uuid::Uuid;

fn item(product_id: Uuid, quantity: i32) -> LineItemInput {
    LineItemInput {
        product_id,
        quantity,
        unit_price: None,
    }
}

struct RecordFields {
    invoice: Option<&'static str>,
    store_id: Uuid,
    distributed_by: Uuid,
    quantity: i32,
    status: DistributionStatus,
}

fn record(fields: RecordFields) -> DistributionRecord {
    let unit_price = Decimal::new(250, 2);
    DistributionRecord {
        id: Uuid::new_v4(),
        business_id: Uuid::nil(),
        batch_invoice_number: fields.invoice.map(str::to_string),
        warehouse_id: Uuid::nil(),
        store_id: fields.store_id,
        product_id: Uuid::new_v4(),
        product_code: "P-1".to_string(),
        product_name: "Widget".to_string(),
        quantity: fields.quantity,
        unit_price,
        line_total: line_total(fields.quantity, unit_price),
        status: fields.status,
        distributed_by: fields.distributed_by,
        distributed_at: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        notes: None,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_submit_status_defaults_to_delivered() {
        assert_eq!(SubmitStatus::default(), SubmitStatus::Delivered);
        assert_eq!(
            DistributionStatus::from(SubmitStatus::PendingAcceptance),
            DistributionStatus::PendingAcceptance
        );
    }

    #[test]
    fn test_merge_sums_repeated_products() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let merged = merge_line_items(&[item(a, 2), item(b, 1), item(a, 3)]).unwrap();
        assert_eq!(merged.len(), 2);
        let a_line = merged.iter().find(|l| l.product_id == a).unwrap();
        assert_eq!(a_line.quantity, 5);
        assert!(merged.windows(2).all(|w| w[0].product_id < w[1].product_id));
    }

    #[test]
    fn test_merge_rejects_bad_lines() {
        let a = Uuid::new_v4();
        assert!(merge_line_items(&[]).is_err());
        let err = merge_line_items(&[item(a, 1), item(a, 0)]).unwrap_err();
        assert_eq!(err.field, "items[1].quantity");

        let mut priced = item(a, 1);
        priced.unit_price = Some(Decimal::new(-1, 0));
        assert_eq!(merge_line_items(&[priced]).unwrap_err().field, "items[0].unit_price");
    }

    #[test]
    fn test_sub_cent_price_rejected() {
        let a = Uuid::new_v4();
        let mut priced = item(a, 3);
        priced.unit_price = Some(Decimal::new(1005, 3));
        assert_eq!(merge_line_items(&[priced]).unwrap_err().field, "items[0].unit_price");
    }

    #[test]
    fn test_merge_rejects_conflicting_prices() {
        let a = Uuid::new_v4();
        let mut first = item(a, 1);
        first.unit_price = Some(Decimal::new(100, 2));
        let mut second = item(a, 1);
        second.unit_price = Some(Decimal::new(120, 2));
        assert!(merge_line_items(&[first, second]).is_err());
    }

    #[test]
    fn test_store_ids_distinct() {
        let s = Uuid::new_v4();
        assert!(validate_store_ids(&[]).is_err());
        assert!(validate_store_ids(&[s, s]).is_err());
        assert!(validate_store_ids(&[s, Uuid::new_v4()]).is_ok());
    }

    /// Three stores times 4 units needs 12; 10 on hand is short for all of them
    #[test]
    fn test_multi_store_shortage_is_aggregate() {
        let p = Uuid::new_v4();
        let required = aggregate_requirements(&[item(p, 4)], 3);
        assert_eq!(required[&p], 12);

        let available = HashMap::from([(p, 10)]);
        let shortages = find_shortages(&required, &available);
        assert_eq!(shortages.len(), 1);
        assert_eq!(shortages[0].required, 12);
        assert_eq!(shortages[0].available, 10);

        let enough = HashMap::from([(p, 12)]);
        assert!(find_shortages(&required, &enough).is_empty());
    }

    #[test]
    fn test_unknown_product_counts_as_zero() {
        let p = Uuid::new_v4();
        let shortages = find_shortages(&aggregate_requirements(&[item(p, 1)], 1), &HashMap::new());
        assert_eq!(shortages[0].available, 0);
    }

    #[test]
    fn test_grouping_by_invoice() {
        let store = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let fields = |invoice, quantity| RecordFields {
            invoice: Some(invoice),
            store_id: store,
            distributed_by: actor,
            quantity,
            status: DistributionStatus::Delivered,
        };
        let batches = group_into_batches(vec![
            record(fields("DIST-20240301-A-0001", 2)),
            record(fields("DIST-20240301-A-0002", 1)),
            record(fields("DIST-20240301-A-0001", 3)),
        ])
        .unwrap();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].batch_id, "DIST-20240301-A-0001");
        assert_eq!(batches[0].lines.len(), 2);
        assert_eq!(batches[0].total_quantity, 5);
        assert_eq!(batches[0].total_amount, Decimal::new(1250, 2));
    }

    /// Legacy rows never merge with a numbered batch
    #[test]
    fn test_legacy_rows_group_separately() {
        let store = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let legacy = record(RecordFields {
            invoice: None,
            store_id: store,
            distributed_by: actor,
            quantity: 1,
            status: DistributionStatus::PendingAcceptance,
        });
        let numbered = record(RecordFields {
            invoice: Some("DIST-20240301-A-0001"),
            store_id: store,
            distributed_by: actor,
            quantity: 1,
            status: DistributionStatus::PendingAcceptance,
        });

        let key = legacy.batch_key();
        assert!(matches!(key, BatchKey::Derived { .. }));
        assert!(key.matches(&legacy));
        assert!(!key.matches(&numbered));
        assert!(key.display_id().starts_with("LEGACY-20240301-"));

        let batches = group_into_batches(vec![legacy, numbered]).unwrap();
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_mixed_status_in_batch_is_an_error() {
        let store = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let err = group_into_batches(vec![
            record(RecordFields {
                invoice: Some("X"),
                store_id: store,
                distributed_by: actor,
                quantity: 1,
                status: DistributionStatus::Accepted,
            }),
            record(RecordFields {
                invoice: Some("X"),
                store_id: store,
                distributed_by: actor,
                quantity: 1,
                status: DistributionStatus::Rejected,
            }),
        ])
        .unwrap_err();
        assert_eq!(err.field, "status");
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        assert_eq!(search_pattern(" a-0001 ").as_deref(), Some("%a-0001%"));
        assert_eq!(search_pattern("50%_off").as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(search_pattern("  "), None);
    }

    #[test]
    fn test_status_transitions() {
        use DistributionStatus::*;
        assert!(Draft.can_transition_to(PendingAcceptance));
        assert!(Draft.can_transition_to(Delivered));
        assert!(PendingAcceptance.can_transition_to(Accepted));
        assert!(PendingAcceptance.can_transition_to(Rejected));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Delivered.can_transition_to(PendingAcceptance));
        assert!(!Rejected.can_transition_to(Accepted));
        assert!(Delivered.is_terminal());
        assert!(!Draft.is_terminal());
    }

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination::from_query(Some(0), Some(500), 20, 100);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 100);

        let third = Pagination::from_query(Some(3), None, 20, 100);
        assert_eq!(third.offset(), 40);
        let page = PaginatedResponse::new(vec![41, 42, 43, 44, 45], &third, 45);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.total_items, 45);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn lines_strategy() -> impl Strategy<Value = Vec<LineItemInput>> {
        let products: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        prop::collection::vec((0usize..5, 1i32..500), 1..20).prop_map(move |pairs| {
            pairs
                .into_iter()
                .map(|(i, qty)| item(products[i], qty))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any accepted price yields a line total the NUMERIC(16,2) column
        /// stores without rounding
        #[test]
        fn prop_accepted_price_keeps_line_total_exact(
            cents in 0i64..100_000_000,
            places in 0u32..5,
            qty in 1i32..10_000,
        ) {
            let price = Decimal::new(cents, places);
            let mut line = item(Uuid::new_v4(), qty);
            line.unit_price = Some(price);

            match merge_line_items(&[line]) {
                Ok(merged) => {
                    let unit = merged[0].unit_price.unwrap();
                    let total = line_total(qty, unit);
                    prop_assert_eq!(unit.round_dp(2), unit);
                    prop_assert_eq!(total.round_dp(2), total);
                    prop_assert_eq!(total, Decimal::from(qty) * unit.round_dp(2));
                }
                Err(err) => {
                    prop_assert_eq!(err.field, "items[0].unit_price");
                    prop_assert!(price.normalize().scale() > 2);
                }
            }
        }

        /// Merging keeps the total quantity per product
        #[test]
        fn prop_merge_preserves_totals(lines in lines_strategy()) {
            let merged = merge_line_items(&lines).unwrap();
            let before = aggregate_requirements(&lines, 1);
            let after = aggregate_requirements(&merged, 1);
            prop_assert_eq!(before, after);
            prop_assert_eq!(merged.len(), merged.iter().map(|l| l.product_id).collect::<std::collections::HashSet<_>>().len());
        }

        /// A shipment passes the availability check iff every product is covered
        #[test]
        fn prop_shortage_iff_uncovered(
            lines in lines_strategy(),
            stores in 1usize..6,
            stock in 0i64..3000,
        ) {
            let required = aggregate_requirements(&lines, stores);
            let available: HashMap<Uuid, i64> = required.keys().map(|p| (*p, stock)).collect();
            let shortages = find_shortages(&required, &available);
            let uncovered = required.values().filter(|need| **need > stock).count();
            prop_assert_eq!(shortages.len(), uncovered);
        }

        /// Grouping keeps every unit
        #[test]
        fn prop_grouping_conserves_quantity(quantities in prop::collection::vec((0usize..3, 1i32..100), 1..30)) {
            let store = Uuid::new_v4();
            let actor = Uuid::new_v4();
            let invoices = ["B-1", "B-2", "B-3"];
            let records: Vec<DistributionRecord> = quantities
                .iter()
                .map(|(i, qty)| record(RecordFields {
                    invoice: Some(invoices[*i]),
                    store_id: store,
                    distributed_by: actor,
                    quantity: *qty,
                    status: DistributionStatus::Delivered,
                }))
                .collect();
            let expected: i64 = quantities.iter().map(|(_, q)| *q as i64).sum();

            let batches = group_into_batches(records).unwrap();
            let total: i64 = batches.iter().map(|b| b.total_quantity).sum();
            prop_assert_eq!(total, expected);
            prop_assert!(batches.len() <= 3);
        }
    }
}

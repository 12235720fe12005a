//! Service tests against Postgres
//!
//! Each test gets a fresh database with the migrations applied (needs
//! `DATABASE_URL`). Covers:
//! - Submission, acceptance and rejection end to end
//! - All-or-nothing multi-store shipments
//! - Idempotent decisions and no overdraw under concurrency
//! - Lock ordering between fan-outs, submissions and returns
//! - Batch numbers never reissued
//! - History paging and search

use chrono::NaiveDate;
use retailhub_backend::config::DistributionConfig;
use retailhub_backend::services::{
    AcceptanceService, DistributionService, DraftService, LedgerService, NotificationService,
    ReturnService,
};
use retailhub_backend::AppError;
use rust_decimal::Decimal;
use shared::{
    BatchFilter, DecisionInput, DistributionStatus, DraftQuery, LineItemInput,
    MultiStoreDistributionInput, NumberingStrategy, ReturnLineInput, SaveDraftInput,
    SubmitDistributionInput, SubmitReturnInput, SubmitStatus,
};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

fn line(product_id: Uuid, quantity: i32) -> LineItemInput {
    LineItemInput {
        product_id,
        quantity,
        unit_price: None,
    }
}

fn shipment(store_id: Uuid, items: Vec<LineItemInput>, status: SubmitStatus) -> SubmitDistributionInput {
    SubmitDistributionInput {
        store_id,
        date: Some(date()),
        items,
        notes: None,
        status,
    }
}

fn fan_out(store_ids: Vec<Uuid>, items: Vec<LineItemInput>) -> MultiStoreDistributionInput {
    MultiStoreDistributionInput {
        store_ids,
        date: Some(date()),
        items,
        notes: None,
    }
}

fn decision(batch_id: &str, reason: Option<&str>) -> DecisionInput {
    DecisionInput {
        invoice_number: Some(batch_id.to_string()),
        reason: reason.map(str::to_string),
        ..DecisionInput::default()
    }
}

/// One tenant with its warehouse, plus helpers to seed and read stock
struct Fixture {
    db: PgPool,
    business_id: Uuid,
    actor_id: Uuid,
    settings: DistributionConfig,
}

impl Fixture {
    async fn new(db: PgPool) -> Self {
        let business_id = Uuid::new_v4();
        let warehouse_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO warehouses (business_id, name) VALUES ($1, 'Central') RETURNING id",
        )
        .bind(business_id)
        .fetch_one(&db)
        .await
        .unwrap();

        Self {
            db,
            business_id,
            actor_id: Uuid::new_v4(),
            settings: DistributionConfig {
                warehouse_id,
                restore_on_reject: false,
                numbering: NumberingStrategy::Sequential,
                default_page_size: 20,
                max_page_size: 100,
            },
        }
    }

    async fn store(&self, code: &str) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO stores (business_id, code, name) VALUES ($1, $2, $2) RETURNING id",
        )
        .bind(self.business_id)
        .bind(code)
        .fetch_one(&self.db)
        .await
        .unwrap()
    }

    /// Catalog product with `on_hand` units in the warehouse
    async fn product(&self, code: &str, on_hand: i32) -> Uuid {
        let product_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO products (business_id, code, name, purchase_price)
            VALUES ($1, $2, $2, 2.50)
            RETURNING id
            "#,
        )
        .bind(self.business_id)
        .bind(code)
        .fetch_one(&self.db)
        .await
        .unwrap();

        sqlx::query(
            r#"
            INSERT INTO warehouse_stock (warehouse_id, product_id, business_id, quantity_on_hand)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(self.settings.warehouse_id)
        .bind(product_id)
        .bind(self.business_id)
        .bind(on_hand)
        .execute(&self.db)
        .await
        .unwrap();

        product_id
    }

    async fn warehouse_qty(&self, product_id: Uuid) -> i32 {
        sqlx::query_scalar::<_, i32>(
            "SELECT quantity_on_hand FROM warehouse_stock WHERE warehouse_id = $1 AND product_id = $2",
        )
        .bind(self.settings.warehouse_id)
        .bind(product_id)
        .fetch_one(&self.db)
        .await
        .unwrap()
    }

    async fn store_qty(&self, store_id: Uuid, product_id: Uuid) -> i32 {
        sqlx::query_scalar::<_, i32>(
            "SELECT quantity_on_hand FROM store_stock WHERE store_id = $1 AND product_id = $2",
        )
        .bind(store_id)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await
        .unwrap()
        .unwrap_or(0)
    }

    async fn record_count(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM distributions WHERE business_id = $1")
            .bind(self.business_id)
            .fetch_one(&self.db)
            .await
            .unwrap()
    }

    fn notifications(&self) -> NotificationService {
        NotificationService::new(self.db.clone(), None)
    }

    fn distributions(&self) -> DistributionService {
        DistributionService::new(self.db.clone(), self.settings.clone(), self.notifications())
    }

    fn acceptance(&self) -> AcceptanceService {
        AcceptanceService::new(self.db.clone(), self.settings.clone(), self.notifications())
    }

    fn drafts(&self) -> DraftService {
        DraftService::new(self.db.clone(), self.settings.clone())
    }

    fn returns(&self) -> ReturnService {
        ReturnService::new(self.db.clone(), self.settings.clone(), self.notifications())
    }
}

// ============================================================================
// Submission and decisions
// ============================================================================

/// A pending shipment leaves the warehouse at once and reaches the store on
/// acceptance, with a purchase mirrored at the store
#[sqlx::test]
async fn test_pending_then_accept(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let x = fx.product("X", 50).await;

    let batch = fx
        .distributions()
        .submit(
            fx.business_id,
            fx.actor_id,
            shipment(store, vec![line(x, 10)], SubmitStatus::PendingAcceptance),
        )
        .await
        .unwrap();

    assert_eq!(batch.batch_id, "DIST-20240301-A-0001");
    assert_eq!(batch.status, DistributionStatus::PendingAcceptance);
    assert_eq!(batch.lines.len(), 1);
    assert_eq!(fx.warehouse_qty(x).await, 40);
    assert_eq!(fx.store_qty(store, x).await, 0);

    let outcome = fx
        .acceptance()
        .accept(fx.business_id, Uuid::new_v4(), store, decision(&batch.batch_id, None))
        .await
        .unwrap();

    assert_eq!(outcome.status, DistributionStatus::Accepted);
    assert!(outcome.records.iter().all(|r| r.status == DistributionStatus::Accepted));
    assert_eq!(fx.store_qty(store, x).await, 10);
    assert_eq!(fx.warehouse_qty(x).await, 40);

    let (purchases, purchased) = sqlx::query_as::<_, (i64, Option<i64>)>(
        r#"
        SELECT COUNT(DISTINCT p.id), SUM(i.quantity)::BIGINT
        FROM store_purchases p
        JOIN store_purchase_items i ON i.purchase_id = p.id
        WHERE p.store_id = $1 AND p.invoice_number = $2
        "#,
    )
    .bind(store)
    .bind(&batch.batch_id)
    .fetch_one(&fx.db)
    .await
    .unwrap();
    assert_eq!(purchases, 1);
    assert_eq!(purchased, Some(10));
}

/// Rejection leaves the store untouched and, by default, does not restock
#[sqlx::test]
async fn test_reject_keeps_warehouse_decremented(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let x = fx.product("X", 50).await;

    let batch = fx
        .distributions()
        .submit(
            fx.business_id,
            fx.actor_id,
            shipment(store, vec![line(x, 10)], SubmitStatus::PendingAcceptance),
        )
        .await
        .unwrap();

    let missing_reason = fx
        .acceptance()
        .reject(fx.business_id, Uuid::new_v4(), store, decision(&batch.batch_id, None))
        .await
        .unwrap_err();
    assert!(matches!(missing_reason, AppError::Validation { .. }));

    let outcome = fx
        .acceptance()
        .reject(
            fx.business_id,
            Uuid::new_v4(),
            store,
            decision(&batch.batch_id, Some("damaged")),
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, DistributionStatus::Rejected);
    assert_eq!(fx.store_qty(store, x).await, 0);
    assert_eq!(fx.warehouse_qty(x).await, 40);
}

/// The second decision on a batch fails and moves no stock
#[sqlx::test]
async fn test_accept_twice(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let x = fx.product("X", 50).await;

    let batch = fx
        .distributions()
        .submit(
            fx.business_id,
            fx.actor_id,
            shipment(store, vec![line(x, 10)], SubmitStatus::PendingAcceptance),
        )
        .await
        .unwrap();

    let acceptance = fx.acceptance();
    let manager = Uuid::new_v4();
    acceptance
        .accept(fx.business_id, manager, store, decision(&batch.batch_id, None))
        .await
        .unwrap();

    let again = acceptance
        .accept(fx.business_id, manager, store, decision(&batch.batch_id, None))
        .await
        .unwrap_err();
    assert!(matches!(again, AppError::BatchNotFoundOrAlreadyProcessed(_)));

    let reject = acceptance
        .reject(fx.business_id, manager, store, decision(&batch.batch_id, Some("late")))
        .await
        .unwrap_err();
    assert!(matches!(reject, AppError::BatchNotFoundOrAlreadyProcessed(_)));

    assert_eq!(fx.store_qty(store, x).await, 10);
    assert_eq!(fx.warehouse_qty(x).await, 40);
}

/// Two accepts racing on one batch: exactly one applies
#[sqlx::test]
async fn test_concurrent_accepts_apply_once(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let x = fx.product("X", 50).await;

    let batch = fx
        .distributions()
        .submit(
            fx.business_id,
            fx.actor_id,
            shipment(store, vec![line(x, 10)], SubmitStatus::PendingAcceptance),
        )
        .await
        .unwrap();

    let acceptance = fx.acceptance();
    let (first, second) = tokio::join!(
        acceptance.accept(fx.business_id, Uuid::new_v4(), store, decision(&batch.batch_id, None)),
        acceptance.accept(fx.business_id, Uuid::new_v4(), store, decision(&batch.batch_id, None)),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AppError::BatchNotFoundOrAlreadyProcessed(_)))));
    assert_eq!(fx.store_qty(store, x).await, 10);
}

/// A delivered shipment moves both sides at once
#[sqlx::test]
async fn test_delivered_moves_both_sides(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let x = fx.product("X", 50).await;
    let y = fx.product("Y", 5).await;

    let batch = fx
        .distributions()
        .submit(
            fx.business_id,
            fx.actor_id,
            shipment(store, vec![line(x, 7), line(y, 5)], SubmitStatus::Delivered),
        )
        .await
        .unwrap();

    assert_eq!(batch.status, DistributionStatus::Delivered);
    assert_eq!(batch.lines.len(), 2);
    assert_eq!(fx.warehouse_qty(x).await, 43);
    assert_eq!(fx.warehouse_qty(y).await, 0);
    assert_eq!(fx.store_qty(store, x).await, 7);
    assert_eq!(fx.store_qty(store, y).await, 5);
}

/// One short product fails the whole fan-out; nothing is written anywhere
#[sqlx::test]
async fn test_multi_store_shortage_is_all_or_nothing(db: PgPool) {
    let fx = Fixture::new(db).await;
    let stores = vec![fx.store("A").await, fx.store("B").await, fx.store("C").await];
    let y = fx.product("Y", 12).await;

    let err = fx
        .distributions()
        .submit_multi(fx.business_id, fx.actor_id, fan_out(stores, vec![line(y, 5)]))
        .await
        .unwrap_err();

    match err {
        AppError::InsufficientStock {
            requested,
            available,
            ..
        } => {
            assert_eq!(requested, 15);
            assert_eq!(available, 12);
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }
    assert_eq!(fx.warehouse_qty(y).await, 12);
    assert_eq!(fx.record_count().await, 0);
}

/// Prices with sub-cent precision are refused before anything is stored
#[sqlx::test]
async fn test_line_totals_match_stored_prices(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let x = fx.product("X", 50).await;

    let mut sub_cent = line(x, 3);
    sub_cent.unit_price = Some(Decimal::new(1005, 3));
    let err = fx
        .distributions()
        .submit(fx.business_id, fx.actor_id, shipment(store, vec![sub_cent], SubmitStatus::Delivered))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "items[0].unit_price"));
    assert_eq!(fx.record_count().await, 0);

    let mut priced = line(x, 3);
    priced.unit_price = Some(Decimal::new(125, 2));
    fx.distributions()
        .submit(fx.business_id, fx.actor_id, shipment(store, vec![priced], SubmitStatus::Delivered))
        .await
        .unwrap();

    let (quantity, unit_price, line_total) = sqlx::query_as::<_, (i32, Decimal, Decimal)>(
        "SELECT quantity, unit_price, line_total FROM distributions WHERE business_id = $1",
    )
    .bind(fx.business_id)
    .fetch_one(&fx.db)
    .await
    .unwrap();
    assert_eq!(Decimal::from(quantity) * unit_price, line_total);
    assert_eq!(line_total, Decimal::new(375, 2));
}

// ============================================================================
// Drafts
// ============================================================================

/// Saving again replaces the previous draft instead of adding to it
#[sqlx::test]
async fn test_draft_save_replaces(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let a = fx.product("PA", 10).await;
    let b = fx.product("PB", 10).await;
    let c = fx.product("PC", 10).await;

    let drafts = fx.drafts();
    let save = |items| SaveDraftInput {
        store_id: store,
        items,
        notes: None,
    };
    drafts
        .save_draft(fx.business_id, fx.actor_id, save(vec![line(a, 1), line(b, 2), line(c, 3)]))
        .await
        .unwrap();
    drafts
        .save_draft(fx.business_id, fx.actor_id, save(vec![line(b, 4)]))
        .await
        .unwrap();

    let listed = drafts
        .list_drafts(
            fx.business_id,
            fx.actor_id,
            DraftQuery {
                store_id: Some(store),
            },
        )
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].lines.len(), 1);
    assert_eq!(listed[0].lines[0].product_id, b);
    assert_eq!(listed[0].lines[0].quantity, 4);
    assert_eq!(fx.warehouse_qty(b).await, 10);
}

// ============================================================================
// Concurrency
// ============================================================================

/// Racing shipments of one product never take more than the warehouse has
#[sqlx::test]
async fn test_concurrent_submits_never_overdraw(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let x = fx.product("X", 10).await;

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let service = fx.distributions();
            let (business_id, actor_id) = (fx.business_id, fx.actor_id);
            tokio::spawn(async move {
                service
                    .submit(
                        business_id,
                        actor_id,
                        shipment(store, vec![line(x, 3)], SubmitStatus::PendingAcceptance),
                    )
                    .await
            })
        })
        .collect();

    let mut shipped = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => shipped += 1,
            Err(AppError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }
    assert_eq!(shipped, 3);
    assert_eq!(fx.warehouse_qty(x).await, 1);
}

/// Simultaneous shipments to one store on one day get distinct numbers
#[sqlx::test]
async fn test_concurrent_numbers_distinct(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let x = fx.product("X", 1_000).await;

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let service = fx.distributions();
            let (business_id, actor_id) = (fx.business_id, fx.actor_id);
            tokio::spawn(async move {
                service
                    .submit(
                        business_id,
                        actor_id,
                        shipment(store, vec![line(x, 1)], SubmitStatus::PendingAcceptance),
                    )
                    .await
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap().batch_id);
    }
    assert_eq!(ids.len(), 100);
    assert_eq!(fx.warehouse_qty(x).await, 900);
}

/// Fan-outs listing the same stores in opposite orders both go through
#[sqlx::test]
async fn test_fan_outs_in_opposite_order(db: PgPool) {
    let fx = Fixture::new(db).await;
    let a = fx.store("A").await;
    let b = fx.store("B").await;
    let p = fx.product("P", 1_000).await;
    let q = fx.product("Q", 1_000).await;

    let service = fx.distributions();
    for _ in 0..20 {
        let (forward, backward) = tokio::join!(
            service.submit_multi(fx.business_id, fx.actor_id, fan_out(vec![a, b], vec![line(p, 1)])),
            service.submit_multi(fx.business_id, fx.actor_id, fan_out(vec![b, a], vec![line(q, 1)])),
        );

        let forward = forward.unwrap();
        let backward = backward.unwrap();
        assert_eq!(forward.iter().map(|batch| batch.store_id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(backward.iter().map(|batch| batch.store_id).collect::<Vec<_>>(), vec![b, a]);
    }
    assert_eq!(fx.warehouse_qty(p).await, 960);
    assert_eq!(fx.warehouse_qty(q).await, 960);
}

/// A delivered shipment and a return on the same store product both go through
#[sqlx::test]
async fn test_submit_and_return_on_same_product(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let x = fx.product("X", 1_000).await;

    let distributions = fx.distributions();
    let returns = fx.returns();
    distributions
        .submit(fx.business_id, fx.actor_id, shipment(store, vec![line(x, 100)], SubmitStatus::Delivered))
        .await
        .unwrap();

    for _ in 0..20 {
        let (shipped, returned) = tokio::join!(
            distributions.submit(
                fx.business_id,
                fx.actor_id,
                shipment(store, vec![line(x, 2)], SubmitStatus::Delivered),
            ),
            returns.submit_return(
                fx.business_id,
                fx.actor_id,
                store,
                SubmitReturnInput {
                    date: Some(date()),
                    items: vec![ReturnLineInput {
                        product_id: x,
                        quantity: 1,
                    }],
                    reason: "overstock".to_string(),
                },
            ),
        );
        shipped.unwrap();
        returned.unwrap();
    }

    assert_eq!(fx.store_qty(store, x).await, 120);
    assert_eq!(fx.warehouse_qty(x).await, 880);
}

// ============================================================================
// Numbering, returns and listings
// ============================================================================

/// A cancelled batch's number is not handed to the next shipment
#[sqlx::test]
async fn test_cancelled_number_not_reused(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let x = fx.product("X", 50).await;

    let service = fx.distributions();
    let first = service
        .submit(
            fx.business_id,
            fx.actor_id,
            shipment(store, vec![line(x, 3)], SubmitStatus::PendingAcceptance),
        )
        .await
        .unwrap();
    service
        .cancel_pending(fx.business_id, fx.actor_id, &first.batch_id)
        .await
        .unwrap();
    assert_eq!(fx.warehouse_qty(x).await, 50);

    let second = service
        .submit(
            fx.business_id,
            fx.actor_id,
            shipment(store, vec![line(x, 3)], SubmitStatus::PendingAcceptance),
        )
        .await
        .unwrap();

    assert_eq!(first.batch_id, "DIST-20240301-A-0001");
    assert_eq!(second.batch_id, "DIST-20240301-A-0002");

    let movements = LedgerService::new(fx.db.clone())
        .movements(fx.business_id, &second.batch_id)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
}

#[sqlx::test]
async fn test_return_moves_stock_back(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let x = fx.product("X", 50).await;

    fx.distributions()
        .submit(fx.business_id, fx.actor_id, shipment(store, vec![line(x, 10)], SubmitStatus::Delivered))
        .await
        .unwrap();

    let returns = fx.returns();
    let stock_return = returns
        .submit_return(
            fx.business_id,
            fx.actor_id,
            store,
            SubmitReturnInput {
                date: Some(date()),
                items: vec![ReturnLineInput {
                    product_id: x,
                    quantity: 4,
                }],
                reason: "expired".to_string(),
            },
        )
        .await
        .unwrap();

    assert_eq!(stock_return.return_number, "RET-20240301-0001");
    assert_eq!(stock_return.total_quantity, 4);
    assert_eq!(fx.store_qty(store, x).await, 6);
    assert_eq!(fx.warehouse_qty(x).await, 44);

    let too_many = returns
        .submit_return(
            fx.business_id,
            fx.actor_id,
            store,
            SubmitReturnInput {
                date: Some(date()),
                items: vec![ReturnLineInput {
                    product_id: x,
                    quantity: 7,
                }],
                reason: "expired".to_string(),
            },
        )
        .await;
    assert!(too_many.is_err());
    assert_eq!(fx.store_qty(store, x).await, 6);
    assert_eq!(fx.warehouse_qty(x).await, 44);
}

/// History pages over batches, newest first, with search done by the query
#[sqlx::test]
async fn test_history_pages_batches(db: PgPool) {
    let fx = Fixture::new(db).await;
    let store = fx.store("A").await;
    let x = fx.product("WIDGET", 100).await;
    let y = fx.product("GADGET", 100).await;

    let service = fx.distributions();
    let mut submitted = Vec::new();
    for items in [vec![line(x, 1), line(y, 1)], vec![line(x, 2)], vec![line(y, 3)]] {
        let batch = service
            .submit(fx.business_id, fx.actor_id, shipment(store, items, SubmitStatus::PendingAcceptance))
            .await
            .unwrap();
        submitted.push(batch.batch_id);
    }

    let first = service
        .list_batches(
            fx.business_id,
            BatchFilter {
                page: Some(1),
                limit: Some(2),
                ..BatchFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(first.pagination.total_items, 3);
    assert_eq!(first.pagination.total_pages, 2);
    let ids: Vec<&str> = first.data.iter().map(|b| b.batch_id.as_str()).collect();
    assert_eq!(ids, vec![submitted[2].as_str(), submitted[1].as_str()]);

    let second = service
        .list_batches(
            fx.business_id,
            BatchFilter {
                page: Some(2),
                limit: Some(2),
                ..BatchFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(second.data.len(), 1);
    assert_eq!(second.data[0].batch_id, submitted[0]);
    assert_eq!(second.data[0].lines.len(), 2);

    let widgets = service
        .list_batches(
            fx.business_id,
            BatchFilter {
                search: Some("widg".to_string()),
                ..BatchFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(widgets.pagination.total_items, 2);
    assert!(widgets.data.iter().all(|b| b.lines.iter().any(|l| l.product_id == x)));

    let pending = fx
        .acceptance()
        .list_pending(fx.business_id, store, Default::default())
        .await
        .unwrap();
    assert_eq!(pending.pagination.total_items, 3);
}

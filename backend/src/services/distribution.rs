//! Distribution submitter
//!
//! Turns line items into persisted distribution batches and moves the
//! warehouse side of the stock through the ledger. Every submission,
//! including the multi-store fan-out, is one transaction: availability is
//! checked under row locks, numbers are allocated, stock moves and records
//! are written, and only then is anything committed. Audit and notification
//! follow the commit.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use shared::{
    aggregate_requirements, find_shortages, group_into_batches, line_total, merge_line_items,
    search_pattern, validate_store_ids, BatchFilter, BatchKey, DistributionBatch, DistributionRecord,
    DistributionStatus, LineItemInput, MovementRef, MultiStoreDistributionInput,
    PaginatedResponse, Pagination, ReferenceType, SubmitDistributionInput, SubmitDraftInput,
};
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::config::DistributionConfig;
use crate::error::{AppError, AppResult};
use crate::services::audit::{action, AuditEntry, AuditService};
use crate::services::ledger::{self, CatalogProduct};
use crate::services::notification::{NewNotification, NotificationService, Severity};
use crate::services::numbering;

pub(crate) const RECORD_COLUMNS: &str = "id, business_id, batch_invoice_number, warehouse_id, store_id, \
     product_id, product_code, product_name, quantity, unit_price, line_total, status, \
     distributed_by, distributed_at, notes, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(crate) struct DistributionRow {
    id: Uuid,
    business_id: Uuid,
    batch_invoice_number: Option<String>,
    warehouse_id: Uuid,
    store_id: Uuid,
    product_id: Uuid,
    product_code: String,
    product_name: String,
    quantity: i32,
    unit_price: Decimal,
    line_total: Decimal,
    status: String,
    distributed_by: Uuid,
    distributed_at: NaiveDate,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DistributionRow> for DistributionRecord {
    type Error = AppError;

    fn try_from(row: DistributionRow) -> Result<Self, Self::Error> {
        let status = DistributionStatus::parse(&row.status)
            .ok_or_else(|| AppError::Internal(format!("unknown distribution status {}", row.status)))?;

        Ok(DistributionRecord {
            id: row.id,
            business_id: row.business_id,
            batch_invoice_number: row.batch_invoice_number,
            warehouse_id: row.warehouse_id,
            store_id: row.store_id,
            product_id: row.product_id,
            product_code: row.product_code,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            line_total: row.line_total,
            status,
            distributed_by: row.distributed_by,
            distributed_at: row.distributed_at,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) fn into_records(rows: Vec<DistributionRow>) -> AppResult<Vec<DistributionRecord>> {
    rows.into_iter().map(DistributionRecord::try_from).collect()
}

/// A line with its catalog entry and final price
#[derive(Debug, Clone)]
pub(crate) struct PricedLine {
    pub product: CatalogProduct,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Resolve products and fill missing prices from the catalog
pub(crate) async fn price_lines(
    conn: &mut PgConnection,
    business_id: Uuid,
    items: &[LineItemInput],
) -> AppResult<Vec<PricedLine>> {
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let product = ledger::catalog_product(conn, business_id, item.product_id).await?;
        let unit_price = item.unit_price.unwrap_or(product.purchase_price);
        lines.push(PricedLine {
            product,
            quantity: item.quantity,
            unit_price,
        });
    }
    Ok(lines)
}

/// Header fields shared by every record of one batch
#[derive(Debug, Clone)]
pub(crate) struct BatchHeader<'a> {
    pub business_id: Uuid,
    pub batch_id: &'a str,
    pub warehouse_id: Uuid,
    pub store_id: Uuid,
    pub distributed_by: Uuid,
    pub distributed_at: NaiveDate,
    pub status: DistributionStatus,
    pub notes: Option<&'a str>,
}

pub(crate) async fn insert_record(
    conn: &mut PgConnection,
    header: &BatchHeader<'_>,
    line: &PricedLine,
) -> AppResult<DistributionRecord> {
    let sql = format!(
        r#"
        INSERT INTO distributions (
            business_id, batch_invoice_number, warehouse_id, store_id, product_id,
            product_code, product_name, quantity, unit_price, line_total,
            status, distributed_by, distributed_at, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING {}
        "#,
        RECORD_COLUMNS
    );

    let row = sqlx::query_as::<_, DistributionRow>(&sql)
        .bind(header.business_id)
        .bind(header.batch_id)
        .bind(header.warehouse_id)
        .bind(header.store_id)
        .bind(line.product.id)
        .bind(&line.product.code)
        .bind(&line.product.name)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line_total(line.quantity, line.unit_price))
        .bind(header.status.as_str())
        .bind(header.distributed_by)
        .bind(header.distributed_at)
        .bind(header.notes)
        .fetch_one(&mut *conn)
        .await?;

    row.try_into()
}

/// Records of one batch, ordered by product id.
///
/// With `lock` the rows stay locked until the caller's transaction ends.
pub(crate) async fn fetch_batch_records(
    conn: &mut PgConnection,
    business_id: Uuid,
    key: &BatchKey,
    status: Option<DistributionStatus>,
    lock: bool,
) -> AppResult<Vec<DistributionRecord>> {
    let lock_clause = if lock { "FOR UPDATE" } else { "" };
    let status = status.map(|s| s.as_str());

    let rows = match key {
        BatchKey::Invoice(number) => {
            let sql = format!(
                r#"
                SELECT {}
                FROM distributions
                WHERE business_id = $1 AND batch_invoice_number = $2
                  AND ($3::text IS NULL OR status = $3)
                ORDER BY product_id, id
                {}
                "#,
                RECORD_COLUMNS, lock_clause
            );
            sqlx::query_as::<_, DistributionRow>(&sql)
                .bind(business_id)
                .bind(number)
                .bind(status)
                .fetch_all(&mut *conn)
                .await?
        }
        BatchKey::Derived {
            date,
            distributed_by,
            store_id,
        } => {
            let sql = format!(
                r#"
                SELECT {}
                FROM distributions
                WHERE business_id = $1 AND batch_invoice_number IS NULL
                  AND distributed_at = $2 AND distributed_by = $3 AND store_id = $4
                  AND ($5::text IS NULL OR status = $5)
                ORDER BY product_id, id
                {}
                "#,
                RECORD_COLUMNS, lock_clause
            );
            sqlx::query_as::<_, DistributionRow>(&sql)
                .bind(business_id)
                .bind(date)
                .bind(distributed_by)
                .bind(store_id)
                .bind(status)
                .fetch_all(&mut *conn)
                .await?
        }
    };

    into_records(rows)
}

/// Fail with `InsufficientStock` unless the warehouse covers `items` for
/// `store_count` stores. Locks the warehouse rows involved.
async fn ensure_available(
    conn: &mut PgConnection,
    business_id: Uuid,
    warehouse_id: Uuid,
    items: &[LineItemInput],
    store_count: usize,
) -> AppResult<()> {
    let required = aggregate_requirements(items, store_count);
    let product_ids: Vec<Uuid> = required.keys().copied().collect();
    let available = ledger::lock_available(conn, business_id, warehouse_id, &product_ids).await?;

    if let Some(shortage) = find_shortages(&required, &available).into_iter().next() {
        let product = ledger::catalog_product(conn, business_id, shortage.product_id).await?;
        return Err(AppError::InsufficientStock {
            product: product.code,
            requested: shortage.required,
            available: shortage.available,
        });
    }
    Ok(())
}

/// Display id of a row's batch: the stored number, or the same
/// `LEGACY-{date}-{actor}-{store}` label `derived_batch_label` builds
const BATCH_KEY_SQL: &str = "COALESCE(batch_invoice_number, 'LEGACY-' \
     || to_char(distributed_at, 'YYYYMMDD') \
     || '-' || upper(left(replace(distributed_by::text, '-', ''), 8)) \
     || '-' || upper(left(replace(store_id::text, '-', ''), 8)))";

/// Row filter shared by the batch page queries, binding `$1..$5`
const BATCH_SCOPE_SQL: &str = "business_id = $1 \
     AND ($2::uuid IS NULL OR store_id = $2) \
     AND (($3::text IS NULL AND status <> 'draft') OR status = $3) \
     AND ($4::date IS NULL OR distributed_at >= $4) \
     AND ($5::date IS NULL OR distributed_at <= $5)";

/// Which batches a listing covers. Without a status, drafts are left out.
#[derive(Debug, Clone, Default)]
pub(crate) struct BatchScope<'a> {
    pub store_id: Option<Uuid>,
    pub status: Option<DistributionStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub search: Option<&'a str>,
}

/// One page of batches, newest first.
///
/// Batch keys are grouped, counted and paged in SQL; only the rows of the
/// keys on the requested page are loaded.
pub(crate) async fn page_batches(
    db: &PgPool,
    business_id: Uuid,
    scope: &BatchScope<'_>,
    pagination: &Pagination,
) -> AppResult<PaginatedResponse<DistributionBatch>> {
    let pattern = scope.search.and_then(search_pattern);
    let status = scope.status.map(|s| s.as_str());

    let grouped = format!(
        r#"
        SELECT {key} AS batch_key, MAX(created_at) AS latest
        FROM distributions
        WHERE {scope}
        GROUP BY 1
        HAVING $6::text IS NULL
            OR bool_or({key} ILIKE $6 OR product_code ILIKE $6 OR product_name ILIKE $6)
        "#,
        key = BATCH_KEY_SQL,
        scope = BATCH_SCOPE_SQL
    );

    let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM ({}) batches", grouped))
        .bind(business_id)
        .bind(scope.store_id)
        .bind(status)
        .bind(scope.from)
        .bind(scope.to)
        .bind(pattern.as_deref())
        .fetch_one(db)
        .await?;

    let keys = sqlx::query_scalar::<_, String>(&format!(
        "SELECT batch_key FROM ({}) batches ORDER BY latest DESC, batch_key LIMIT $7 OFFSET $8",
        grouped
    ))
    .bind(business_id)
    .bind(scope.store_id)
    .bind(status)
    .bind(scope.from)
    .bind(scope.to)
    .bind(pattern.as_deref())
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(db)
    .await?;

    if keys.is_empty() {
        return Ok(PaginatedResponse::new(Vec::new(), pagination, total as u64));
    }

    let sql = format!(
        r#"
        SELECT {columns}
        FROM distributions
        WHERE {scope} AND {key} = ANY($6)
        ORDER BY created_at DESC, id
        "#,
        columns = RECORD_COLUMNS,
        scope = BATCH_SCOPE_SQL,
        key = BATCH_KEY_SQL
    );
    let rows = sqlx::query_as::<_, DistributionRow>(&sql)
        .bind(business_id)
        .bind(scope.store_id)
        .bind(status)
        .bind(scope.from)
        .bind(scope.to)
        .bind(&keys)
        .fetch_all(db)
        .await?;

    let mut batches = group_into_batches(into_records(rows)?)?;
    batches.sort_by_key(|batch| keys.iter().position(|key| *key == batch.batch_id));
    Ok(PaginatedResponse::new(batches, pagination, total as u64))
}

pub(crate) fn single_batch(records: Vec<DistributionRecord>) -> AppResult<DistributionBatch> {
    group_into_batches(records)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal("batch has no records".to_string()))
}

/// Distribution service
#[derive(Clone)]
pub struct DistributionService {
    db: PgPool,
    settings: DistributionConfig,
    audit: AuditService,
    notifications: NotificationService,
}

impl DistributionService {
    pub fn new(db: PgPool, settings: DistributionConfig, notifications: NotificationService) -> Self {
        Self {
            audit: AuditService::new(db.clone()),
            db,
            settings,
            notifications,
        }
    }

    /// Ship `items` to one store
    pub async fn submit(
        &self,
        business_id: Uuid,
        actor_id: Uuid,
        input: SubmitDistributionInput,
    ) -> AppResult<DistributionBatch> {
        input.validate()?;
        let items = merge_line_items(&input.items)?;
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());
        let warehouse_id = self.settings.warehouse_id;

        let mut tx = self.db.begin().await?;

        ledger::ensure_warehouse(&mut tx, business_id, warehouse_id).await?;
        ledger::ensure_store(&mut tx, business_id, input.store_id).await?;
        ensure_available(&mut tx, business_id, warehouse_id, &items, 1).await?;

        let batch_id = numbering::next_batch_id(
            &mut tx,
            business_id,
            input.store_id,
            date,
            self.settings.numbering,
        )
        .await?;

        let header = BatchHeader {
            business_id,
            batch_id: &batch_id,
            warehouse_id,
            store_id: input.store_id,
            distributed_by: actor_id,
            distributed_at: date,
            status: input.status.into(),
            notes: input.notes.as_deref(),
        };
        let records = self.ship(&mut tx, &header, &items).await?;

        tx.commit().await?;

        let batch = single_batch(records)?;
        self.after_submit(business_id, &batch, actor_id);
        self.audit_submit(business_id, actor_id, &batch).await;
        Ok(batch)
    }

    /// Ship the same `items` to every store in one transaction.
    ///
    /// Batches come back in the order the stores were listed.
    pub async fn submit_multi(
        &self,
        business_id: Uuid,
        actor_id: Uuid,
        input: MultiStoreDistributionInput,
    ) -> AppResult<Vec<DistributionBatch>> {
        input.validate()?;
        validate_store_ids(&input.store_ids)?;
        let items = merge_line_items(&input.items)?;
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());
        let warehouse_id = self.settings.warehouse_id;

        // Numbering and store rows are locked in store id order whatever
        // order the caller listed the stores in
        let mut lock_order = input.store_ids.clone();
        lock_order.sort_unstable();

        let mut tx = self.db.begin().await?;

        ledger::ensure_warehouse(&mut tx, business_id, warehouse_id).await?;
        for store_id in &lock_order {
            ledger::ensure_store(&mut tx, business_id, *store_id).await?;
        }
        ensure_available(&mut tx, business_id, warehouse_id, &items, lock_order.len()).await?;

        let mut shipped: HashMap<Uuid, DistributionBatch> = HashMap::with_capacity(lock_order.len());
        for store_id in &lock_order {
            let batch_id = numbering::next_batch_id(
                &mut tx,
                business_id,
                *store_id,
                date,
                self.settings.numbering,
            )
            .await?;

            let header = BatchHeader {
                business_id,
                batch_id: &batch_id,
                warehouse_id,
                store_id: *store_id,
                distributed_by: actor_id,
                distributed_at: date,
                status: DistributionStatus::PendingAcceptance,
                notes: input.notes.as_deref(),
            };
            let records = self.ship(&mut tx, &header, &items).await?;
            shipped.insert(*store_id, single_batch(records)?);
        }

        let batches = input
            .store_ids
            .iter()
            .map(|store_id| {
                shipped
                    .remove(store_id)
                    .ok_or_else(|| AppError::Internal(format!("store {} was not shipped", store_id)))
            })
            .collect::<AppResult<Vec<_>>>()?;

        tx.commit().await?;

        tracing::info!(
            actor_id = %actor_id,
            stores = batches.len(),
            lines = items.len(),
            "Multi-store distribution submitted"
        );
        for batch in &batches {
            self.after_submit(business_id, batch, actor_id);
            self.audit_submit(business_id, actor_id, batch).await;
        }
        Ok(batches)
    }

    /// Submit a draft batch as a new shipment; the draft is consumed
    pub async fn submit_draft(
        &self,
        business_id: Uuid,
        actor_id: Uuid,
        draft_id: &str,
        input: SubmitDraftInput,
    ) -> AppResult<DistributionBatch> {
        let mut tx = self.db.begin().await?;

        let key = BatchKey::Invoice(draft_id.to_string());
        let draft = fetch_batch_records(
            &mut tx,
            business_id,
            &key,
            Some(DistributionStatus::Draft),
            true,
        )
        .await?;
        let first = draft
            .first()
            .ok_or_else(|| AppError::NotFound(format!("Draft {}", draft_id)))?;
        if first.distributed_by != actor_id {
            return Err(AppError::Forbidden(
                "Only the author of a draft can submit it".to_string(),
            ));
        }

        let store_id = first.store_id;
        let notes = first.notes.clone();
        let draft_items: Vec<LineItemInput> = draft
            .iter()
            .map(|r| LineItemInput {
                product_id: r.product_id,
                quantity: r.quantity,
                unit_price: Some(r.unit_price),
            })
            .collect();
        let items = merge_line_items(&draft_items)?;
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());
        let warehouse_id = self.settings.warehouse_id;

        sqlx::query(
            "DELETE FROM distributions WHERE business_id = $1 AND batch_invoice_number = $2 AND status = 'draft'",
        )
        .bind(business_id)
        .bind(draft_id)
        .execute(&mut *tx)
        .await?;

        ledger::ensure_warehouse(&mut tx, business_id, warehouse_id).await?;
        ensure_available(&mut tx, business_id, warehouse_id, &items, 1).await?;

        let batch_id = numbering::next_batch_id(
            &mut tx,
            business_id,
            store_id,
            date,
            self.settings.numbering,
        )
        .await?;

        let header = BatchHeader {
            business_id,
            batch_id: &batch_id,
            warehouse_id,
            store_id,
            distributed_by: actor_id,
            distributed_at: date,
            status: input.status.into(),
            notes: notes.as_deref(),
        };
        let records = self.ship(&mut tx, &header, &items).await?;

        tx.commit().await?;

        let batch = single_batch(records)?;
        tracing::info!(draft = %draft_id, batch = %batch.batch_id, "Draft submitted");
        self.after_submit(business_id, &batch, actor_id);
        self.audit
            .record(
                AuditEntry::new(
                    business_id,
                    actor_id,
                    action::DISTRIBUTION_SUBMITTED,
                    "distribution_batch",
                    &batch.batch_id,
                )
                .old_value(json!({ "draft": draft_id }))
                .new_value(batch_summary(&batch))
                .store(batch.store_id),
            )
            .await;
        Ok(batch)
    }

    /// Delete a pending batch and give its units back to the warehouse
    pub async fn cancel_pending(
        &self,
        business_id: Uuid,
        actor_id: Uuid,
        batch_id: &str,
    ) -> AppResult<DistributionBatch> {
        let mut tx = self.db.begin().await?;

        let key = BatchKey::Invoice(batch_id.to_string());
        let records = fetch_batch_records(
            &mut tx,
            business_id,
            &key,
            Some(DistributionStatus::PendingAcceptance),
            true,
        )
        .await?;
        if records.is_empty() {
            return Err(AppError::BatchNotFoundOrAlreadyProcessed(batch_id.to_string()));
        }

        let reference = MovementRef::new(ReferenceType::Cancellation, batch_id, actor_id);
        for record in &records {
            ledger::restore_to_warehouse(
                &mut tx,
                business_id,
                record.warehouse_id,
                record.product_id,
                record.quantity,
                &reference,
            )
            .await?;
        }

        let ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        sqlx::query("DELETE FROM distributions WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let batch = single_batch(records)?;
        tracing::info!(
            batch = %batch.batch_id,
            store_id = %batch.store_id,
            actor_id = %actor_id,
            lines = batch.lines.len(),
            "Pending distribution cancelled"
        );
        self.notifications.notify(NewNotification {
            business_id,
            store_id: batch.store_id,
            title: "Shipment cancelled".to_string(),
            message: format!("Shipment {} was cancelled by the warehouse", batch.batch_id),
            severity: Severity::Warning,
            data: Some(batch_summary(&batch)),
        });
        self.audit
            .record(
                AuditEntry::new(
                    business_id,
                    actor_id,
                    action::DISTRIBUTION_CANCELLED,
                    "distribution_batch",
                    &batch.batch_id,
                )
                .old_value(batch_summary(&batch))
                .store(batch.store_id),
            )
            .await;
        Ok(batch)
    }

    /// Warehouse history, newest batch first. Drafts only appear when asked for.
    pub async fn list_batches(
        &self,
        business_id: Uuid,
        filter: BatchFilter,
    ) -> AppResult<PaginatedResponse<DistributionBatch>> {
        let pagination = Pagination::from_query(
            filter.page,
            filter.limit,
            self.settings.default_page_size,
            self.settings.max_page_size,
        );
        let scope = BatchScope {
            store_id: filter.store_id,
            status: filter.status,
            from: filter.from,
            to: filter.to,
            search: filter.search.as_deref(),
        };
        page_batches(&self.db, business_id, &scope, &pagination).await
    }

    pub async fn get_batch(&self, business_id: Uuid, batch_id: &str) -> AppResult<DistributionBatch> {
        let mut conn = self.db.acquire().await?;
        let key = BatchKey::Invoice(batch_id.to_string());
        let records = fetch_batch_records(&mut conn, business_id, &key, None, false).await?;
        if records.is_empty() {
            return Err(AppError::NotFound(format!("Distribution batch {}", batch_id)));
        }
        single_batch(records)
    }

    /// Move stock and write one record per line. `items` must be merged.
    async fn ship(
        &self,
        conn: &mut PgConnection,
        header: &BatchHeader<'_>,
        items: &[LineItemInput],
    ) -> AppResult<Vec<DistributionRecord>> {
        let lines = price_lines(conn, header.business_id, items).await?;
        let reference = MovementRef::new(
            ReferenceType::Distribution,
            header.batch_id,
            header.distributed_by,
        );

        let mut records = Vec::with_capacity(lines.len());
        for line in &lines {
            match header.status {
                DistributionStatus::Delivered => {
                    ledger::upsert_store_product(
                        conn,
                        header.business_id,
                        header.store_id,
                        &line.product,
                        line.unit_price,
                    )
                    .await?;
                    ledger::transfer_stock(
                        conn,
                        header.business_id,
                        header.warehouse_id,
                        header.store_id,
                        line.product.id,
                        line.quantity,
                        &reference,
                    )
                    .await?;
                }
                DistributionStatus::PendingAcceptance => {
                    ledger::withdraw_from_warehouse(
                        conn,
                        header.business_id,
                        header.warehouse_id,
                        line.product.id,
                        line.quantity,
                        &reference,
                    )
                    .await?;
                    ledger::upsert_store_product(
                        conn,
                        header.business_id,
                        header.store_id,
                        &line.product,
                        line.unit_price,
                    )
                    .await?;
                }
                other => {
                    return Err(AppError::InvalidStateTransition(format!(
                        "cannot submit a shipment as {}",
                        other
                    )));
                }
            }
            records.push(insert_record(conn, header, line).await?);
        }
        Ok(records)
    }

    fn after_submit(&self, business_id: Uuid, batch: &DistributionBatch, actor_id: Uuid) {
        tracing::info!(
            batch = %batch.batch_id,
            store_id = %batch.store_id,
            actor_id = %actor_id,
            lines = batch.lines.len(),
            status = %batch.status,
            "Distribution submitted"
        );

        let (title, message, severity) = if batch.status == DistributionStatus::PendingAcceptance {
            (
                "Shipment awaiting acceptance",
                format!(
                    "Shipment {} with {} units is waiting for your confirmation",
                    batch.batch_id, batch.total_quantity
                ),
                Severity::Info,
            )
        } else {
            (
                "Shipment delivered",
                format!(
                    "Shipment {} with {} units was added to your stock",
                    batch.batch_id, batch.total_quantity
                ),
                Severity::Success,
            )
        };

        self.notifications.notify(NewNotification {
            business_id,
            store_id: batch.store_id,
            title: title.to_string(),
            message,
            severity,
            data: Some(batch_summary(batch)),
        });
    }

    async fn audit_submit(&self, business_id: Uuid, actor_id: Uuid, batch: &DistributionBatch) {
        self.audit
            .record(
                AuditEntry::new(
                    business_id,
                    actor_id,
                    action::DISTRIBUTION_SUBMITTED,
                    "distribution_batch",
                    &batch.batch_id,
                )
                .new_value(batch_summary(batch))
                .store(batch.store_id),
            )
            .await;
    }
}

/// Compact JSON view used by audit entries and notifications
pub(crate) fn batch_summary(batch: &DistributionBatch) -> serde_json::Value {
    json!({
        "batch_id": batch.batch_id,
        "store_id": batch.store_id,
        "status": batch.status,
        "lines": batch.lines.len(),
        "total_quantity": batch.total_quantity,
        "total_amount": batch.total_amount,
    })
}

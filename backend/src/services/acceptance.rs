//! Acceptance coordinator
//!
//! The receiving store's side of a shipment. A pending batch is accepted or
//! rejected as a whole inside one transaction. Its rows are locked first, so
//! a second concurrent decision finds nothing pending and fails with
//! `BatchNotFoundOrAlreadyProcessed` instead of applying stock twice.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use shared::{
    append_decision_note, decision_effects, group_into_batches, validate_reject_reason,
    BatchKey, Decision, DecisionInput, DecisionOutcome, DistributionBatch, DistributionRecord,
    DistributionStatus, MovementRef, PaginatedResponse, Pagination, ReferenceType, RejectPolicy,
};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::DistributionConfig;
use crate::error::{AppError, AppResult};
use crate::services::audit::{action, AuditEntry, AuditService};
use crate::services::distribution::{
    batch_summary, fetch_batch_records, page_batches, BatchScope, DistributionRow, RECORD_COLUMNS,
};
use crate::services::ledger;
use crate::services::notification::{NewNotification, NotificationService, Severity};

/// Pending list query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PendingQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Acceptance service
#[derive(Clone)]
pub struct AcceptanceService {
    db: PgPool,
    settings: DistributionConfig,
    audit: AuditService,
    notifications: NotificationService,
}

impl AcceptanceService {
    pub fn new(db: PgPool, settings: DistributionConfig, notifications: NotificationService) -> Self {
        Self {
            audit: AuditService::new(db.clone()),
            db,
            settings,
            notifications,
        }
    }

    /// Pending batches for a store, newest first
    pub async fn list_pending(
        &self,
        business_id: Uuid,
        store_id: Uuid,
        query: PendingQuery,
    ) -> AppResult<PaginatedResponse<DistributionBatch>> {
        let pagination = Pagination::from_query(
            query.page,
            query.limit,
            self.settings.default_page_size,
            self.settings.max_page_size,
        );
        let scope = BatchScope {
            store_id: Some(store_id),
            status: Some(DistributionStatus::PendingAcceptance),
            search: query.search.as_deref(),
            ..BatchScope::default()
        };
        page_batches(&self.db, business_id, &scope, &pagination).await
    }

    pub async fn accept(
        &self,
        business_id: Uuid,
        actor_id: Uuid,
        store_id: Uuid,
        input: DecisionInput,
    ) -> AppResult<DecisionOutcome> {
        let key = input.batch_key(store_id)?;
        self.decide(business_id, actor_id, store_id, key, Decision::Accept, input.reason.as_deref())
            .await
    }

    /// Reject a pending batch; a reason is mandatory
    pub async fn reject(
        &self,
        business_id: Uuid,
        actor_id: Uuid,
        store_id: Uuid,
        input: DecisionInput,
    ) -> AppResult<DecisionOutcome> {
        let key = input.batch_key(store_id)?;
        let reason = validate_reject_reason(input.reason.as_deref())?;
        self.decide(business_id, actor_id, store_id, key, Decision::Reject, Some(reason))
            .await
    }

    async fn decide(
        &self,
        business_id: Uuid,
        actor_id: Uuid,
        store_id: Uuid,
        key: BatchKey,
        decision: Decision,
        reason: Option<&str>,
    ) -> AppResult<DecisionOutcome> {
        let batch_id = key.display_id();
        let target = decision.target_status();

        let mut tx = self.db.begin().await?;

        let records = fetch_batch_records(
            &mut tx,
            business_id,
            &key,
            Some(DistributionStatus::PendingAcceptance),
            true,
        )
        .await?;
        let first = records
            .first()
            .ok_or_else(|| AppError::BatchNotFoundOrAlreadyProcessed(batch_id.clone()))?;
        if records.iter().any(|r| r.store_id != store_id) {
            return Err(AppError::Forbidden(format!(
                "Batch {} is not addressed to store {}",
                batch_id, store_id
            )));
        }
        if !first.status.can_transition_to(target) {
            return Err(AppError::InvalidStateTransition(format!(
                "{} -> {}",
                first.status, target
            )));
        }

        let policy = RejectPolicy {
            restore_on_reject: self.settings.restore_on_reject,
        };
        let by_id: HashMap<Uuid, &DistributionRecord> = records.iter().map(|r| (r.id, r)).collect();
        let supplier = match decision {
            Decision::Accept => Some(ledger::ensure_warehouse(&mut tx, business_id, first.warehouse_id).await?),
            Decision::Reject => None,
        };

        for effect in decision_effects(decision, &records, policy) {
            let record = by_id
                .get(&effect.record_id)
                .ok_or_else(|| AppError::Internal("decision effect without record".to_string()))?;

            if effect.store_delta > 0 {
                let reference = MovementRef::new(ReferenceType::Acceptance, &batch_id, actor_id);
                ledger::receive_into_store(
                    &mut tx,
                    business_id,
                    record.store_id,
                    record.product_id,
                    effect.store_delta,
                    &reference,
                )
                .await?;
            }
            if effect.warehouse_delta > 0 {
                let reference = MovementRef::new(ReferenceType::Rejection, &batch_id, actor_id);
                ledger::restore_to_warehouse(
                    &mut tx,
                    business_id,
                    record.warehouse_id,
                    record.product_id,
                    effect.warehouse_delta,
                    &reference,
                )
                .await?;
            }
            if let Some(supplier) = supplier.as_deref() {
                record_purchase(&mut tx, business_id, actor_id, supplier, &batch_id, record).await?;
            }
        }

        let mut updated = Vec::with_capacity(records.len());
        for record in &records {
            let notes = append_decision_note(record.notes.as_deref(), decision, reason);
            let sql = format!(
                r#"
                UPDATE distributions
                SET status = $1, notes = $2, updated_at = NOW()
                WHERE id = $3
                RETURNING {}
                "#,
                RECORD_COLUMNS
            );
            let row = sqlx::query_as::<_, DistributionRow>(&sql)
                .bind(target.as_str())
                .bind(&notes)
                .bind(record.id)
                .fetch_one(&mut *tx)
                .await?;
            updated.push(DistributionRecord::try_from(row)?);
        }

        tx.commit().await?;

        tracing::info!(
            batch = %batch_id,
            store_id = %store_id,
            actor_id = %actor_id,
            lines = updated.len(),
            status = %target,
            restore_on_reject = policy.restore_on_reject,
            "Distribution batch decided"
        );

        let outcome = DecisionOutcome {
            batch_id,
            status: target,
            records: updated,
        };
        self.after_decision(business_id, actor_id, store_id, decision, reason, &outcome)
            .await;
        Ok(outcome)
    }

    async fn after_decision(
        &self,
        business_id: Uuid,
        actor_id: Uuid,
        store_id: Uuid,
        decision: Decision,
        reason: Option<&str>,
        outcome: &DecisionOutcome,
    ) {
        let summary = group_into_batches(outcome.records.clone())
            .ok()
            .and_then(|batches| batches.first().map(batch_summary))
            .unwrap_or_else(|| json!({ "batch_id": outcome.batch_id }));

        let (audit_action, title, severity) = match decision {
            Decision::Accept => (action::BATCH_ACCEPTED, "Shipment accepted", Severity::Success),
            Decision::Reject => (action::BATCH_REJECTED, "Shipment rejected", Severity::Warning),
        };

        self.notifications.notify(NewNotification {
            business_id,
            store_id,
            title: title.to_string(),
            message: match reason {
                Some(reason) => format!("{} {}: {}", title, outcome.batch_id, reason),
                None => format!("{} {}", title, outcome.batch_id),
            },
            severity,
            data: Some(summary.clone()),
        });

        self.audit
            .record(
                AuditEntry::new(
                    business_id,
                    actor_id,
                    audit_action,
                    "distribution_batch",
                    &outcome.batch_id,
                )
                .old_value(json!({ "status": DistributionStatus::PendingAcceptance }))
                .new_value(json!({ "summary": summary, "reason": reason, "decided_at": Utc::now() }))
                .store(store_id),
            )
            .await;
    }
}

/// Mirror one accepted record as a store purchase with one line
async fn record_purchase(
    conn: &mut PgConnection,
    business_id: Uuid,
    actor_id: Uuid,
    supplier: &str,
    invoice_number: &str,
    record: &DistributionRecord,
) -> AppResult<()> {
    let purchase_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO store_purchases (
            business_id, store_id, distribution_id, supplier_name, invoice_number,
            purchase_date, total_amount, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(business_id)
    .bind(record.store_id)
    .bind(record.id)
    .bind(supplier)
    .bind(invoice_number)
    .bind(record.distributed_at)
    .bind(record.line_total)
    .bind(actor_id)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO store_purchase_items (
            purchase_id, product_id, product_code, product_name, quantity, unit_price, line_total
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(purchase_id)
    .bind(record.product_id)
    .bind(&record.product_code)
    .bind(&record.product_name)
    .bind(record.quantity)
    .bind(record.unit_price)
    .bind(record.line_total)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

//! Draft composer
//!
//! Drafts are `draft`-status batches. They never touch stock, and saving is
//! full replacement: the previous draft for the same (store, actor) pair is
//! deleted before the new lines are written.

use chrono::Utc;
use serde_json::json;
use shared::{
    group_into_batches, merge_line_items, BatchKey, DistributionBatch, DistributionRecord,
    DistributionStatus, DraftQuery, SaveDraftInput, UpdateDraftInput,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::config::DistributionConfig;
use crate::error::{AppError, AppResult};
use crate::services::audit::{action, AuditEntry, AuditService};
use crate::services::distribution::{
    batch_summary, fetch_batch_records, insert_record, into_records, price_lines, BatchHeader,
    single_batch, DistributionRow, RECORD_COLUMNS,
};
use crate::services::{ledger, numbering};

/// Draft service
#[derive(Clone)]
pub struct DraftService {
    db: PgPool,
    settings: DistributionConfig,
    audit: AuditService,
}

impl DraftService {
    pub fn new(db: PgPool, settings: DistributionConfig) -> Self {
        Self {
            audit: AuditService::new(db.clone()),
            db,
            settings,
        }
    }

    /// Replace the actor's draft for a store
    pub async fn save_draft(
        &self,
        business_id: Uuid,
        actor_id: Uuid,
        input: SaveDraftInput,
    ) -> AppResult<DistributionBatch> {
        input.validate()?;
        let items = merge_line_items(&input.items)?;
        let today = Utc::now().date_naive();
        let warehouse_id = self.settings.warehouse_id;

        let mut tx = self.db.begin().await?;

        ledger::ensure_warehouse(&mut tx, business_id, warehouse_id).await?;
        ledger::ensure_store(&mut tx, business_id, input.store_id).await?;

        let replaced = sqlx::query(
            r#"
            DELETE FROM distributions
            WHERE business_id = $1 AND store_id = $2 AND distributed_by = $3 AND status = 'draft'
            "#,
        )
        .bind(business_id)
        .bind(input.store_id)
        .bind(actor_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let batch_id = numbering::next_batch_id(
            &mut tx,
            business_id,
            input.store_id,
            today,
            self.settings.numbering,
        )
        .await?;

        let header = BatchHeader {
            business_id,
            batch_id: &batch_id,
            warehouse_id,
            store_id: input.store_id,
            distributed_by: actor_id,
            distributed_at: today,
            status: DistributionStatus::Draft,
            notes: input.notes.as_deref(),
        };
        let records = write_lines(&mut tx, &header, &items).await?;

        tx.commit().await?;

        let batch = single_batch(records)?;
        tracing::info!(
            batch = %batch.batch_id,
            store_id = %batch.store_id,
            actor_id = %actor_id,
            lines = batch.lines.len(),
            replaced_lines = replaced,
            "Draft saved"
        );
        self.audit
            .record(
                AuditEntry::new(business_id, actor_id, action::DRAFT_SAVED, "draft", &batch.batch_id)
                    .new_value(batch_summary(&batch))
                    .store(batch.store_id),
            )
            .await;
        Ok(batch)
    }

    /// The actor's drafts, optionally for one store
    pub async fn list_drafts(
        &self,
        business_id: Uuid,
        actor_id: Uuid,
        query: DraftQuery,
    ) -> AppResult<Vec<DistributionBatch>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM distributions
            WHERE business_id = $1 AND distributed_by = $2 AND status = 'draft'
              AND ($3::uuid IS NULL OR store_id = $3)
            ORDER BY created_at DESC, product_id
            "#,
            RECORD_COLUMNS
        );

        let rows = sqlx::query_as::<_, DistributionRow>(&sql)
            .bind(business_id)
            .bind(actor_id)
            .bind(query.store_id)
            .fetch_all(&self.db)
            .await?;

        Ok(group_into_batches(into_records(rows)?)?)
    }

    /// Replace the lines of an existing draft, keeping its id
    pub async fn update_draft(
        &self,
        business_id: Uuid,
        actor_id: Uuid,
        batch_id: &str,
        input: UpdateDraftInput,
    ) -> AppResult<DistributionBatch> {
        input.validate()?;
        let items = merge_line_items(&input.items)?;

        let mut tx = self.db.begin().await?;

        let existing = owned_draft(&mut tx, business_id, actor_id, batch_id).await?;
        let before = single_batch(existing.clone())?;
        let first = &existing[0];

        delete_lines(&mut tx, business_id, batch_id).await?;

        let header = BatchHeader {
            business_id,
            batch_id,
            warehouse_id: first.warehouse_id,
            store_id: first.store_id,
            distributed_by: actor_id,
            distributed_at: first.distributed_at,
            status: DistributionStatus::Draft,
            notes: input.notes.as_deref(),
        };
        let records = write_lines(&mut tx, &header, &items).await?;

        tx.commit().await?;

        let batch = single_batch(records)?;
        tracing::info!(
            batch = %batch_id,
            store_id = %batch.store_id,
            actor_id = %actor_id,
            lines = batch.lines.len(),
            "Draft updated"
        );
        self.audit
            .record(
                AuditEntry::new(business_id, actor_id, action::DRAFT_UPDATED, "draft", batch_id)
                    .old_value(batch_summary(&before))
                    .new_value(batch_summary(&batch))
                    .store(batch.store_id),
            )
            .await;
        Ok(batch)
    }

    pub async fn delete_draft(&self, business_id: Uuid, actor_id: Uuid, batch_id: &str) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let existing = owned_draft(&mut tx, business_id, actor_id, batch_id).await?;
        let before = single_batch(existing)?;
        delete_lines(&mut tx, business_id, batch_id).await?;

        tx.commit().await?;

        tracing::info!(
            batch = %batch_id,
            store_id = %before.store_id,
            actor_id = %actor_id,
            lines = before.lines.len(),
            "Draft deleted"
        );
        self.audit
            .record(
                AuditEntry::new(business_id, actor_id, action::DRAFT_DELETED, "draft", batch_id)
                    .old_value(json!({ "summary": batch_summary(&before) }))
                    .store(before.store_id),
            )
            .await;
        Ok(())
    }
}

/// Locked draft rows, checked for ownership
async fn owned_draft(
    conn: &mut PgConnection,
    business_id: Uuid,
    actor_id: Uuid,
    batch_id: &str,
) -> AppResult<Vec<DistributionRecord>> {
    let key = BatchKey::Invoice(batch_id.to_string());
    let records =
        fetch_batch_records(conn, business_id, &key, Some(DistributionStatus::Draft), true).await?;

    match records.first().map(|r| r.distributed_by) {
        None => Err(AppError::NotFound(format!("Draft {}", batch_id))),
        Some(author) if author != actor_id => Err(AppError::Forbidden(
            "Only the author of a draft can change it".to_string(),
        )),
        Some(_) => Ok(records),
    }
}

async fn delete_lines(conn: &mut PgConnection, business_id: Uuid, batch_id: &str) -> AppResult<()> {
    sqlx::query(
        "DELETE FROM distributions WHERE business_id = $1 AND batch_invoice_number = $2 AND status = 'draft'",
    )
    .bind(business_id)
    .bind(batch_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn write_lines(
    conn: &mut PgConnection,
    header: &BatchHeader<'_>,
    items: &[shared::LineItemInput],
) -> AppResult<Vec<DistributionRecord>> {
    let lines = price_lines(conn, header.business_id, items).await?;
    let mut records = Vec::with_capacity(lines.len());
    for line in &lines {
        records.push(insert_record(conn, header, line).await?);
    }
    Ok(records)
}

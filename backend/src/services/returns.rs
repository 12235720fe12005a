//! Store returns
//!
//! A store sends stock back to the warehouse under a `RET-{date}-{seq}`
//! number. Each line is a ledger `reverse_transfer`, all in one transaction.
//! The warehouse rows are locked before any store row, the same order a
//! delivered submission takes them in.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use shared::{
    merge_return_lines, MovementRef, ReferenceType, StockReturn, StockReturnItem, SubmitReturnInput,
};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::config::DistributionConfig;
use crate::error::AppResult;
use crate::services::audit::{action, AuditEntry, AuditService};
use crate::services::notification::{NewNotification, NotificationService, Severity};
use crate::services::{ledger, numbering};

#[derive(Debug, FromRow)]
struct ReturnRow {
    id: Uuid,
    business_id: Uuid,
    return_number: String,
    store_id: Uuid,
    warehouse_id: Uuid,
    returned_by: Uuid,
    return_date: NaiveDate,
    reason: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ReturnItemRow {
    return_id: Uuid,
    product_id: Uuid,
    product_code: String,
    quantity: i32,
}

impl ReturnRow {
    fn into_return(self, items: Vec<StockReturnItem>) -> StockReturn {
        let total_quantity = items.iter().map(|i| i.quantity as i64).sum();
        StockReturn {
            id: self.id,
            business_id: self.business_id,
            return_number: self.return_number,
            store_id: self.store_id,
            warehouse_id: self.warehouse_id,
            returned_by: self.returned_by,
            return_date: self.return_date,
            reason: self.reason,
            items,
            total_quantity,
            created_at: self.created_at,
        }
    }
}

/// Return service
#[derive(Clone)]
pub struct ReturnService {
    db: PgPool,
    settings: DistributionConfig,
    audit: AuditService,
    notifications: NotificationService,
}

impl ReturnService {
    pub fn new(db: PgPool, settings: DistributionConfig, notifications: NotificationService) -> Self {
        Self {
            audit: AuditService::new(db.clone()),
            db,
            settings,
            notifications,
        }
    }

    pub async fn submit_return(
        &self,
        business_id: Uuid,
        actor_id: Uuid,
        store_id: Uuid,
        input: SubmitReturnInput,
    ) -> AppResult<StockReturn> {
        input.validate()?;
        let lines = merge_return_lines(&input.items)?;
        let date = input.date.unwrap_or_else(|| Utc::now().date_naive());
        let reason = input.reason.trim().to_string();
        let warehouse_id = self.settings.warehouse_id;

        let mut tx = self.db.begin().await?;

        ledger::ensure_warehouse(&mut tx, business_id, warehouse_id).await?;
        ledger::ensure_store(&mut tx, business_id, store_id).await?;
        let product_ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
        ledger::lock_available(&mut tx, business_id, warehouse_id, &product_ids).await?;
        let return_number = numbering::next_return_number(&mut tx, business_id, date).await?;

        let header = sqlx::query_as::<_, ReturnRow>(
            r#"
            INSERT INTO stock_returns (
                business_id, return_number, store_id, warehouse_id, returned_by, return_date, reason
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, business_id, return_number, store_id, warehouse_id, returned_by,
                      return_date, reason, created_at
            "#,
        )
        .bind(business_id)
        .bind(&return_number)
        .bind(store_id)
        .bind(warehouse_id)
        .bind(actor_id)
        .bind(date)
        .bind(&reason)
        .fetch_one(&mut *tx)
        .await?;

        let reference = MovementRef::new(ReferenceType::Return, &return_number, actor_id);
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let product = ledger::catalog_product(&mut tx, business_id, line.product_id).await?;
            ledger::reverse_transfer(
                &mut tx,
                business_id,
                warehouse_id,
                store_id,
                line.product_id,
                line.quantity,
                &reference,
            )
            .await?;

            sqlx::query(
                r#"
                INSERT INTO stock_return_items (return_id, product_id, product_code, quantity)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(header.id)
            .bind(line.product_id)
            .bind(&product.code)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            items.push(StockReturnItem {
                product_id: line.product_id,
                product_code: product.code,
                quantity: line.quantity,
            });
        }

        tx.commit().await?;

        let stock_return = header.into_return(items);
        tracing::info!(
            batch = %stock_return.return_number,
            store_id = %store_id,
            actor_id = %actor_id,
            lines = stock_return.items.len(),
            "Stock return submitted"
        );

        let summary = json!({
            "return_number": stock_return.return_number,
            "lines": stock_return.items.len(),
            "total_quantity": stock_return.total_quantity,
            "reason": stock_return.reason,
        });
        self.notifications.notify(NewNotification {
            business_id,
            store_id,
            title: "Stock returned".to_string(),
            message: format!(
                "Return {} sent {} units back to the warehouse",
                stock_return.return_number, stock_return.total_quantity
            ),
            severity: Severity::Info,
            data: Some(summary.clone()),
        });
        self.audit
            .record(
                AuditEntry::new(
                    business_id,
                    actor_id,
                    action::RETURN_SUBMITTED,
                    "stock_return",
                    &stock_return.return_number,
                )
                .new_value(summary)
                .store(store_id),
            )
            .await;

        Ok(stock_return)
    }

    /// A store's returns, newest first
    pub async fn list_returns(&self, business_id: Uuid, store_id: Uuid) -> AppResult<Vec<StockReturn>> {
        let headers = sqlx::query_as::<_, ReturnRow>(
            r#"
            SELECT id, business_id, return_number, store_id, warehouse_id, returned_by,
                   return_date, reason, created_at
            FROM stock_returns
            WHERE business_id = $1 AND store_id = $2
            ORDER BY return_date DESC, created_at DESC
            "#,
        )
        .bind(business_id)
        .bind(store_id)
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = headers.iter().map(|h| h.id).collect();
        let item_rows = sqlx::query_as::<_, ReturnItemRow>(
            r#"
            SELECT return_id, product_id, product_code, quantity
            FROM stock_return_items
            WHERE return_id = ANY($1)
            ORDER BY product_code
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut items: HashMap<Uuid, Vec<StockReturnItem>> = HashMap::new();
        for row in item_rows {
            items.entry(row.return_id).or_default().push(StockReturnItem {
                product_id: row.product_id,
                product_code: row.product_code,
                quantity: row.quantity,
            });
        }

        Ok(headers
            .into_iter()
            .map(|h| {
                let lines = items.remove(&h.id).unwrap_or_default();
                h.into_return(lines)
            })
            .collect())
    }
}

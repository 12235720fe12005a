//! Audit trail for distribution state changes
//!
//! Entries are written after the primary transaction commits. A failed write
//! is logged and dropped; it never changes the result of the operation.

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Audit actions
pub mod action {
    pub const DISTRIBUTION_SUBMITTED: &str = "distribution.submitted";
    pub const DISTRIBUTION_CANCELLED: &str = "distribution.cancelled";
    pub const BATCH_ACCEPTED: &str = "distribution.accepted";
    pub const BATCH_REJECTED: &str = "distribution.rejected";
    pub const DRAFT_SAVED: &str = "draft.saved";
    pub const DRAFT_UPDATED: &str = "draft.updated";
    pub const DRAFT_DELETED: &str = "draft.deleted";
    pub const RETURN_SUBMITTED: &str = "return.submitted";
}

#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub business_id: Uuid,
    pub actor_id: Uuid,
    pub action: &'static str,
    pub entity: &'static str,
    pub entity_id: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub store_id: Option<Uuid>,
}

impl AuditEntry {
    pub fn new(
        business_id: Uuid,
        actor_id: Uuid,
        action: &'static str,
        entity: &'static str,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            business_id,
            actor_id,
            action,
            entity,
            entity_id: entity_id.into(),
            old_value: None,
            new_value: None,
            store_id: None,
        }
    }

    pub fn old_value(mut self, value: Value) -> Self {
        self.old_value = Some(value);
        self
    }

    pub fn new_value(mut self, value: Value) -> Self {
        self.new_value = Some(value);
        self
    }

    pub fn store(mut self, store_id: Uuid) -> Self {
        self.store_id = Some(store_id);
        self
    }
}

#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn record(&self, entry: AuditEntry) {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_logs (
                business_id, actor_id, action, entity, entity_id, old_value, new_value, store_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.business_id)
        .bind(entry.actor_id)
        .bind(entry.action)
        .bind(entry.entity)
        .bind(&entry.entity_id)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(entry.store_id)
        .execute(&self.db)
        .await;

        if let Err(e) = result {
            tracing::warn!(
                action = entry.action,
                entity_id = %entry.entity_id,
                error = %e,
                "Failed to write audit entry"
            );
        }
    }
}

//! Warehouse-to-store distribution models
//!
//! A distribution batch is a set of [`DistributionRecord`] line items that
//! share one [`BatchKey`]. The receiving store accepts or rejects the batch
//! as a whole.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::numbering::derived_batch_label;

/// Lifecycle status of a distribution line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    Draft,
    PendingAcceptance,
    Accepted,
    Rejected,
    Delivered,
}

impl DistributionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionStatus::Draft => "draft",
            DistributionStatus::PendingAcceptance => "pending_acceptance",
            DistributionStatus::Accepted => "accepted",
            DistributionStatus::Rejected => "rejected",
            DistributionStatus::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(DistributionStatus::Draft),
            "pending_acceptance" => Some(DistributionStatus::PendingAcceptance),
            "accepted" => Some(DistributionStatus::Accepted),
            "rejected" => Some(DistributionStatus::Rejected),
            "delivered" => Some(DistributionStatus::Delivered),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DistributionStatus::Accepted | DistributionStatus::Rejected | DistributionStatus::Delivered
        )
    }

    /// Batch-wide transitions. Deleting a draft is not a transition.
    pub fn can_transition_to(&self, next: DistributionStatus) -> bool {
        use DistributionStatus::*;
        matches!(
            (self, next),
            (Draft, PendingAcceptance)
                | (Draft, Delivered)
                | (PendingAcceptance, Accepted)
                | (PendingAcceptance, Rejected)
        )
    }
}

impl std::fmt::Display for DistributionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status a submission may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStatus {
    #[default]
    Delivered,
    PendingAcceptance,
}

impl From<SubmitStatus> for DistributionStatus {
    fn from(status: SubmitStatus) -> Self {
        match status {
            SubmitStatus::Delivered => DistributionStatus::Delivered,
            SubmitStatus::PendingAcceptance => DistributionStatus::PendingAcceptance,
        }
    }
}

/// One line item of a shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub id: Uuid,
    pub business_id: Uuid,
    /// Missing on rows written before batch numbering existed
    pub batch_invoice_number: Option<String>,
    pub warehouse_id: Uuid,
    pub store_id: Uuid,
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub status: DistributionStatus,
    pub distributed_by: Uuid,
    pub distributed_at: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DistributionRecord {
    pub fn batch_key(&self) -> BatchKey {
        match &self.batch_invoice_number {
            Some(number) => BatchKey::Invoice(number.clone()),
            None => BatchKey::Derived {
                date: self.distributed_at,
                distributed_by: self.distributed_by,
                store_id: self.store_id,
            },
        }
    }
}

/// Identity of a distribution batch.
///
/// `Invoice` is the stored batch number. `Derived` is computed for legacy
/// rows without one and only ever matches rows whose stored number is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BatchKey {
    Invoice(String),
    Derived {
        date: NaiveDate,
        distributed_by: Uuid,
        store_id: Uuid,
    },
}

impl BatchKey {
    /// Human-readable id shown in listings and used as purchase invoice
    pub fn display_id(&self) -> String {
        match self {
            BatchKey::Invoice(number) => number.clone(),
            BatchKey::Derived {
                date,
                distributed_by,
                store_id,
            } => derived_batch_label(*date, *distributed_by, *store_id),
        }
    }

    pub fn matches(&self, record: &DistributionRecord) -> bool {
        match (self, &record.batch_invoice_number) {
            (BatchKey::Invoice(number), Some(stored)) => number == stored,
            (
                BatchKey::Derived {
                    date,
                    distributed_by,
                    store_id,
                },
                None,
            ) => {
                record.distributed_at == *date
                    && record.distributed_by == *distributed_by
                    && record.store_id == *store_id
            }
            _ => false,
        }
    }

    /// Store the key is pinned to, if the key itself names one
    pub fn store_id(&self) -> Option<Uuid> {
        match self {
            BatchKey::Invoice(_) => None,
            BatchKey::Derived { store_id, .. } => Some(*store_id),
        }
    }
}

impl std::fmt::Display for BatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_id())
    }
}

/// Line of a grouped batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchLine {
    pub record_id: Uuid,
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub notes: Option<String>,
}

/// A distribution batch assembled from its records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionBatch {
    pub key: BatchKey,
    pub batch_id: String,
    pub warehouse_id: Uuid,
    pub store_id: Uuid,
    pub distributed_by: Uuid,
    pub distributed_at: NaiveDate,
    pub status: DistributionStatus,
    pub lines: Vec<BatchLine>,
    pub total_quantity: i64,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl DistributionBatch {
    fn open(record: &DistributionRecord) -> Self {
        let key = record.batch_key();
        Self {
            batch_id: key.display_id(),
            key,
            warehouse_id: record.warehouse_id,
            store_id: record.store_id,
            distributed_by: record.distributed_by,
            distributed_at: record.distributed_at,
            status: record.status,
            lines: Vec::new(),
            total_quantity: 0,
            total_amount: Decimal::ZERO,
            created_at: record.created_at,
        }
    }

    fn push(&mut self, record: DistributionRecord) -> Result<(), BatchConsistencyError> {
        let mismatch = if record.store_id != self.store_id {
            Some("store_id")
        } else if record.warehouse_id != self.warehouse_id {
            Some("warehouse_id")
        } else if record.distributed_by != self.distributed_by {
            Some("distributed_by")
        } else if record.status != self.status {
            Some("status")
        } else {
            None
        };
        if let Some(field) = mismatch {
            return Err(BatchConsistencyError {
                batch_id: self.batch_id.clone(),
                field,
            });
        }

        self.total_quantity += record.quantity as i64;
        self.total_amount += record.line_total;
        if record.created_at < self.created_at {
            self.created_at = record.created_at;
        }
        self.lines.push(BatchLine {
            record_id: record.id,
            product_id: record.product_id,
            product_code: record.product_code,
            product_name: record.product_name,
            quantity: record.quantity,
            unit_price: record.unit_price,
            line_total: record.line_total,
            notes: record.notes,
        });
        Ok(())
    }
}

/// Records sharing a batch key disagree on a batch-wide field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("batch {batch_id} has mixed {field} across its records")]
pub struct BatchConsistencyError {
    pub batch_id: String,
    pub field: &'static str,
}

/// Group records into batches, keeping the order in which keys first appear
pub fn group_into_batches(
    records: impl IntoIterator<Item = DistributionRecord>,
) -> Result<Vec<DistributionBatch>, BatchConsistencyError> {
    let mut batches: Vec<DistributionBatch> = Vec::new();
    let mut index: std::collections::HashMap<BatchKey, usize> = std::collections::HashMap::new();

    for record in records {
        let key = record.batch_key();
        let slot = match index.get(&key) {
            Some(slot) => *slot,
            None => {
                batches.push(DistributionBatch::open(&record));
                index.insert(key, batches.len() - 1);
                batches.len() - 1
            }
        };
        batches[slot].push(record)?;
    }

    Ok(batches)
}

pub fn line_total(quantity: i32, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price
}

/// `ILIKE` pattern matching `needle` anywhere, with its own wildcards
/// escaped. Blank needles match everything and give `None`.
pub fn search_pattern(needle: &str) -> Option<String> {
    let needle = needle.trim();
    if needle.is_empty() {
        return None;
    }
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

/// Receiving store's decision on a pending batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn target_status(&self) -> DistributionStatus {
        match self {
            Decision::Accept => DistributionStatus::Accepted,
            Decision::Reject => DistributionStatus::Rejected,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Decision::Accept => "Accepted",
            Decision::Reject => "Rejected",
        }
    }
}

/// Append the decision and its reason to a record's notes
pub fn append_decision_note(existing: Option<&str>, decision: Decision, reason: Option<&str>) -> String {
    let entry = match reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => format!("{}: {}", decision.label(), reason),
        None => decision.label().to_string(),
    };
    match existing.map(str::trim_end).filter(|n| !n.is_empty()) {
        Some(notes) => format!("{}\n{}", notes, entry),
        None => entry,
    }
}

/// Result of an accept or reject
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub batch_id: String,
    pub status: DistributionStatus,
    pub records: Vec<DistributionRecord>,
}

/// Whether a rejected batch gives its units back to the warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RejectPolicy {
    pub restore_on_reject: bool,
}

/// Net stock effect of a decision on one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockEffect {
    pub record_id: Uuid,
    pub product_id: Uuid,
    pub store_delta: i32,
    pub warehouse_delta: i32,
}

/// Stock changes a decision applies, one entry per record in ledger order
pub fn decision_effects(
    decision: Decision,
    records: &[DistributionRecord],
    policy: RejectPolicy,
) -> Vec<StockEffect> {
    let mut effects: Vec<StockEffect> = records
        .iter()
        .map(|record| {
            let (store_delta, warehouse_delta) = match decision {
                Decision::Accept => (record.quantity, 0),
                Decision::Reject if policy.restore_on_reject => (0, record.quantity),
                Decision::Reject => (0, 0),
            };
            StockEffect {
                record_id: record.id,
                product_id: record.product_id,
                store_delta,
                warehouse_delta,
            }
        })
        .collect();
    effects.sort_by_key(|effect| (effect.product_id, effect.record_id));
    effects
}

// ============================================================================
// Inputs
// ============================================================================

/// One requested line of a shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LineItemInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    /// Falls back to the catalog purchase price when absent
    pub unit_price: Option<Decimal>,
}

/// Single-store submission
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitDistributionInput {
    pub store_id: Uuid,
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineItemInput>,
    pub notes: Option<String>,
    #[serde(default)]
    pub status: SubmitStatus,
}

/// Fan-out submission; every store receives the same item list
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MultiStoreDistributionInput {
    #[validate(length(min = 1, message = "At least one store is required"))]
    pub store_ids: Vec<Uuid>,
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineItemInput>,
    pub notes: Option<String>,
}

/// Accept or reject request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionInput {
    pub invoice_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub distributed_by: Option<Uuid>,
    pub reason: Option<String>,
}

impl DecisionInput {
    /// Resolve the batch key for a decision addressed to `store_id`
    pub fn batch_key(&self, store_id: Uuid) -> Result<BatchKey, crate::validation::FieldError> {
        if let Some(number) = self.invoice_number.as_deref().map(str::trim) {
            if !number.is_empty() {
                return Ok(BatchKey::Invoice(number.to_string()));
            }
        }
        match (self.date, self.distributed_by) {
            (Some(date), Some(distributed_by)) => Ok(BatchKey::Derived {
                date,
                distributed_by,
                store_id,
            }),
            _ => Err(crate::validation::FieldError::new(
                "invoice_number",
                "Either invoice_number or both date and distributed_by are required",
            )),
        }
    }
}

/// Warehouse history filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchFilter {
    pub store_id: Option<Uuid>,
    pub status: Option<DistributionStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

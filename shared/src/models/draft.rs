//! Draft shipment models
//!
//! A draft is a DRAFT-status batch owned by the actor who composed it. Saving
//! replaces the whole draft, it never merges with a previous one.

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{LineItemInput, SubmitStatus};

/// Save (or replace) the draft for a store
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveDraftInput {
    pub store_id: Uuid,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineItemInput>,
    pub notes: Option<String>,
}

/// Replace the contents of an existing draft batch
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateDraftInput {
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<LineItemInput>,
    pub notes: Option<String>,
}

/// Draft listing filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftQuery {
    pub store_id: Option<Uuid>,
}

/// Turn a draft into a real shipment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitDraftInput {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub status: SubmitStatus,
}

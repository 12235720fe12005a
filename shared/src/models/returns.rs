//! Store-to-warehouse return models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One returned product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Return request from a store
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitReturnInput {
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<ReturnLineInput>,
    #[validate(length(min = 1, max = 500, message = "A reason is required"))]
    pub reason: String,
}

/// A return invoice (`RET-…`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReturn {
    pub id: Uuid,
    pub business_id: Uuid,
    pub return_number: String,
    pub store_id: Uuid,
    pub warehouse_id: Uuid,
    pub returned_by: Uuid,
    pub return_date: NaiveDate,
    pub reason: String,
    pub items: Vec<StockReturnItem>,
    pub total_quantity: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReturnItem {
    pub product_id: Uuid,
    pub product_code: String,
    pub quantity: i32,
}

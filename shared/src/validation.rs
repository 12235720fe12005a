//! Validation rules for distribution input
//!
//! Everything here runs before any database work, so a failure always means
//! nothing happened.

use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::models::{LineItemInput, ReturnLineInput};

/// Validation failure tied to one input field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Product whose aggregate requirement exceeds what the warehouse holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shortage {
    pub product_id: Uuid,
    pub required: i64,
    pub available: i64,
}

/// Validate a shipment's line items
pub fn validate_line_items(items: &[LineItemInput]) -> Result<(), FieldError> {
    if items.is_empty() {
        return Err(FieldError::new("items", "At least one item is required"));
    }
    for (i, item) in items.iter().enumerate() {
        if item.validate().is_err() || item.quantity <= 0 {
            return Err(FieldError::new(
                format!("items[{}].quantity", i),
                "Quantity must be at least 1",
            ));
        }
        if let Some(price) = item.unit_price {
            check_unit_price(price).map_err(|message| {
                FieldError::new(format!("items[{}].unit_price", i), message)
            })?;
        }
    }
    Ok(())
}

/// Decimal places stored for prices and line totals
pub const PRICE_SCALE: u32 = 2;

/// Largest price a `NUMERIC(14,2)` column holds
pub fn max_unit_price() -> Decimal {
    Decimal::new(99_999_999_999_999, PRICE_SCALE)
}

/// Largest line total a `NUMERIC(16,2)` column holds
pub fn max_line_total() -> Decimal {
    Decimal::new(9_999_999_999_999_999, PRICE_SCALE)
}

/// A price must be stored exactly, so `quantity * unit_price` stays equal to
/// the stored line total
pub fn check_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err("Unit price cannot have more than 2 decimal places");
    }
    if price > max_unit_price() {
        return Err("Unit price is too large");
    }
    Ok(())
}

/// Merge repeated products into one line each, ordered by product id.
///
/// The ordering doubles as the ledger's lock order.
pub fn merge_line_items(items: &[LineItemInput]) -> Result<Vec<LineItemInput>, FieldError> {
    validate_line_items(items)?;

    let mut merged: BTreeMap<Uuid, LineItemInput> = BTreeMap::new();
    for item in items {
        match merged.get_mut(&item.product_id) {
            None => {
                merged.insert(item.product_id, item.clone());
            }
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| FieldError::new("items", "Quantity too large"))?;
                match (existing.unit_price, item.unit_price) {
                    (Some(a), Some(b)) if a != b => {
                        return Err(FieldError::new(
                            "items",
                            format!("Conflicting unit prices for product {}", item.product_id),
                        ));
                    }
                    (None, Some(b)) => existing.unit_price = Some(b),
                    _ => {}
                }
            }
        }
    }
    for item in merged.values() {
        if let Some(price) = item.unit_price {
            if Decimal::from(item.quantity) * price > max_line_total() {
                return Err(FieldError::new(
                    "items",
                    format!("Line total too large for product {}", item.product_id),
                ));
            }
        }
    }
    Ok(merged.into_values().collect())
}

/// Destination stores must be non-empty and distinct
pub fn validate_store_ids(store_ids: &[Uuid]) -> Result<(), FieldError> {
    if store_ids.is_empty() {
        return Err(FieldError::new("store_ids", "At least one store is required"));
    }
    let mut seen = HashSet::new();
    for id in store_ids {
        if !seen.insert(id) {
            return Err(FieldError::new(
                "store_ids",
                format!("Store {} is listed more than once", id),
            ));
        }
    }
    Ok(())
}

/// Units needed per product when `items` go to `store_count` stores
pub fn aggregate_requirements(items: &[LineItemInput], store_count: usize) -> BTreeMap<Uuid, i64> {
    let mut required: BTreeMap<Uuid, i64> = BTreeMap::new();
    for item in items {
        *required.entry(item.product_id).or_default() += item.quantity as i64 * store_count as i64;
    }
    required
}

/// Every product whose requirement is not covered. Unknown products count as zero available.
pub fn find_shortages(required: &BTreeMap<Uuid, i64>, available: &HashMap<Uuid, i64>) -> Vec<Shortage> {
    required
        .iter()
        .filter_map(|(product_id, needed)| {
            let have = available.get(product_id).copied().unwrap_or(0);
            (*needed > have).then_some(Shortage {
                product_id: *product_id,
                required: *needed,
                available: have,
            })
        })
        .collect()
}

/// A rejection must say why
pub fn validate_reject_reason(reason: Option<&str>) -> Result<&str, FieldError> {
    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => Ok(r),
        _ => Err(FieldError::new("reason", "A reason is required to reject a batch")),
    }
}

/// Validate and merge return lines, ordered by product id
pub fn merge_return_lines(lines: &[ReturnLineInput]) -> Result<Vec<ReturnLineInput>, FieldError> {
    if lines.is_empty() {
        return Err(FieldError::new("items", "At least one item is required"));
    }
    let mut merged: BTreeMap<Uuid, i32> = BTreeMap::new();
    for (i, line) in lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(FieldError::new(
                format!("items[{}].quantity", i),
                "Quantity must be at least 1",
            ));
        }
        let entry = merged.entry(line.product_id).or_default();
        *entry = entry
            .checked_add(line.quantity)
            .ok_or_else(|| FieldError::new("items", "Quantity too large"))?;
    }
    Ok(merged
        .into_iter()
        .map(|(product_id, quantity)| ReturnLineInput { product_id, quantity })
        .collect())
}

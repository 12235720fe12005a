//! Stock ledger models
//!
//! Quantities are whole units. Every quantity change in the system goes
//! through [`StockLevel`] so the non-negative and reservation invariants are
//! checked in one place before anything is written.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by stock arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("stock quantity overflow")]
    Overflow,

    #[error("stock row violates invariants: on hand {on_hand}, reserved {reserved}")]
    InvariantViolated { on_hand: i32, reserved: i32 },
}

/// Quantity snapshot of one stock row.
///
/// For store rows `reserved` is always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub on_hand: i32,
    pub reserved: i32,
}

impl StockLevel {
    /// Build a level, rejecting rows that break `0 <= reserved <= on_hand`
    pub fn new(on_hand: i32, reserved: i32) -> Result<Self, StockError> {
        if on_hand < 0 || reserved < 0 || reserved > on_hand {
            return Err(StockError::InvariantViolated { on_hand, reserved });
        }
        Ok(Self { on_hand, reserved })
    }

    /// An empty row, used when a store receives a product for the first time
    pub fn empty() -> Self {
        Self {
            on_hand: 0,
            reserved: 0,
        }
    }

    /// Units that can be moved out without touching reservations
    pub fn available(&self) -> i32 {
        self.on_hand - self.reserved
    }

    /// Take `quantity` units out of this row
    pub fn withdraw(self, quantity: i32) -> Result<Self, StockError> {
        ensure_positive(quantity)?;
        if quantity > self.available() {
            return Err(StockError::InsufficientStock {
                requested: quantity as i64,
                available: self.available() as i64,
            });
        }
        Ok(Self {
            on_hand: self.on_hand - quantity,
            reserved: self.reserved,
        })
    }

    /// Put `quantity` units into this row
    pub fn deposit(self, quantity: i32) -> Result<Self, StockError> {
        ensure_positive(quantity)?;
        let on_hand = self
            .on_hand
            .checked_add(quantity)
            .ok_or(StockError::Overflow)?;
        Ok(Self {
            on_hand,
            reserved: self.reserved,
        })
    }
}

fn ensure_positive(quantity: i32) -> Result<(), StockError> {
    if quantity <= 0 {
        return Err(StockError::InvalidQuantity(quantity));
    }
    Ok(())
}

/// Where a stock row lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Warehouse,
    Store,
}

impl LocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::Warehouse => "warehouse",
            LocationKind::Store => "store",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "warehouse" => Some(LocationKind::Warehouse),
            "store" => Some(LocationKind::Store),
            _ => None,
        }
    }
}

/// Direction and side of a movement log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    WarehouseOut,
    WarehouseIn,
    StoreIn,
    StoreOut,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::WarehouseOut => "warehouse_out",
            MovementKind::WarehouseIn => "warehouse_in",
            MovementKind::StoreIn => "store_in",
            MovementKind::StoreOut => "store_out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "warehouse_out" => Some(MovementKind::WarehouseOut),
            "warehouse_in" => Some(MovementKind::WarehouseIn),
            "store_in" => Some(MovementKind::StoreIn),
            "store_out" => Some(MovementKind::StoreOut),
            _ => None,
        }
    }

    pub fn location(&self) -> LocationKind {
        match self {
            MovementKind::WarehouseOut | MovementKind::WarehouseIn => LocationKind::Warehouse,
            MovementKind::StoreIn | MovementKind::StoreOut => LocationKind::Store,
        }
    }

    /// Signed effect of the movement on the row it touches
    pub fn signed(&self, quantity: i32) -> i64 {
        match self {
            MovementKind::WarehouseIn | MovementKind::StoreIn => quantity as i64,
            MovementKind::WarehouseOut | MovementKind::StoreOut => -(quantity as i64),
        }
    }
}

/// What triggered a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Distribution,
    Acceptance,
    Rejection,
    Cancellation,
    Return,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Distribution => "distribution",
            ReferenceType::Acceptance => "acceptance",
            ReferenceType::Rejection => "rejection",
            ReferenceType::Cancellation => "cancellation",
            ReferenceType::Return => "return",
        }
    }
}

/// Reference carried into every ledger call and stamped on the movement row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRef {
    pub reference_type: ReferenceType,
    pub reference: String,
    pub actor_id: Uuid,
}

impl MovementRef {
    pub fn new(reference_type: ReferenceType, reference: impl Into<String>, actor_id: Uuid) -> Self {
        Self {
            reference_type,
            reference: reference.into(),
            actor_id,
        }
    }
}

/// Immutable movement log row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub business_id: Uuid,
    pub product_id: Uuid,
    pub location_kind: LocationKind,
    pub location_id: Uuid,
    pub kind: MovementKind,
    pub quantity: i32,
    pub balance_after: i32,
    pub reference_type: String,
    pub reference: String,
    pub actor_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Warehouse stock row joined with its catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseStock {
    pub warehouse_id: Uuid,
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub quantity_on_hand: i32,
    pub quantity_reserved: i32,
    pub updated_at: DateTime<Utc>,
}

/// Store-side product row; the store's own copy of catalog data plus quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStock {
    pub store_id: Uuid,
    pub product_id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub category: Option<String>,
    pub purchase_price: Decimal,
    pub selling_price: Option<Decimal>,
    pub quantity_on_hand: i32,
    pub updated_at: DateTime<Utc>,
}

//! Actor roles and store access rules
//!
//! Identity itself comes from the external identity provider; these rules
//! only decide what an already-authenticated actor may do.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const PERMISSION_DISTRIBUTE: &str = "distribution:create";
pub const PERMISSION_RECEIVE: &str = "distribution:accept";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    WarehouseOperator,
    StoreManager,
    Cashier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::WarehouseOperator => "warehouse_operator",
            Role::StoreManager => "store_manager",
            Role::Cashier => "cashier",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "warehouse_operator" => Some(Role::WarehouseOperator),
            "store_manager" => Some(Role::StoreManager),
            "cashier" => Some(Role::Cashier),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("actor may not ship stock from the warehouse")]
    NotWarehouseStaff,

    #[error("actor is not assigned to store {0}")]
    WrongStore(Uuid),

    #[error("actor role {0} cannot receive shipments")]
    RoleCannotReceive(&'static str),
}

/// Warehouse-side operations: submit, drafts, cancellations
pub fn authorize_warehouse(role: Role, permissions: &[String]) -> Result<(), AccessError> {
    match role {
        Role::Admin | Role::WarehouseOperator => Ok(()),
        _ if permissions.iter().any(|p| p == PERMISSION_DISTRIBUTE) => Ok(()),
        _ => Err(AccessError::NotWarehouseStaff),
    }
}

/// Read access to a store's data: any actor whose home store is `store_id`
pub fn authorize_store(home_store_id: Option<Uuid>, store_id: Uuid) -> Result<(), AccessError> {
    if home_store_id == Some(store_id) {
        Ok(())
    } else {
        Err(AccessError::WrongStore(store_id))
    }
}

/// Accepting or rejecting a batch destined for `store_id`
pub fn authorize_receiving(
    role: Role,
    permissions: &[String],
    home_store_id: Option<Uuid>,
    store_id: Uuid,
) -> Result<(), AccessError> {
    authorize_store(home_store_id, store_id)?;
    match role {
        Role::StoreManager | Role::Admin => Ok(()),
        _ if permissions.iter().any(|p| p == PERMISSION_RECEIVE) => Ok(()),
        other => Err(AccessError::RoleCannotReceive(other.as_str())),
    }
}

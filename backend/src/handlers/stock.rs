//! HTTP handlers for ledger reads

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::{StockMovement, StoreStock, WarehouseStock};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::LedgerService;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct WarehouseStockQuery {
    pub product_id: Option<Uuid>,
}

/// Levels in the configured warehouse
pub async fn warehouse_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<WarehouseStockQuery>,
) -> AppResult<Json<Vec<WarehouseStock>>> {
    current_user.0.require_warehouse()?;
    let levels = LedgerService::new(state.db)
        .warehouse_levels(
            current_user.0.business_id,
            state.config.distribution.warehouse_id,
            query.product_id,
        )
        .await?;
    Ok(Json(levels))
}

pub async fn store_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<Vec<StoreStock>>> {
    current_user.0.require_store(store_id)?;
    let levels = LedgerService::new(state.db)
        .store_levels(current_user.0.business_id, store_id)
        .await?;
    Ok(Json(levels))
}

/// Movement log for a batch or return number
pub async fn movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(reference): Path<String>,
) -> AppResult<Json<Vec<StockMovement>>> {
    current_user.0.require_warehouse()?;
    let movements = LedgerService::new(state.db)
        .movements(current_user.0.business_id, &reference)
        .await?;
    Ok(Json(movements))
}

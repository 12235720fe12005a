//! HTTP handlers for warehouse-side distribution endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{
    BatchFilter, DistributionBatch, MultiStoreDistributionInput, PaginatedResponse,
    SubmitDistributionInput,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::DistributionService;
use crate::AppState;

fn service(state: &AppState) -> DistributionService {
    DistributionService::new(
        state.db.clone(),
        state.config.distribution.clone(),
        state.notifications(),
    )
}

/// Ship items to one store
pub async fn submit_distribution(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<SubmitDistributionInput>,
) -> AppResult<(StatusCode, Json<DistributionBatch>)> {
    current_user.0.require_warehouse()?;
    let batch = service(&state)
        .submit(current_user.0.business_id, current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// Ship the same items to several stores
pub async fn submit_multi_distribution(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<MultiStoreDistributionInput>,
) -> AppResult<(StatusCode, Json<Vec<DistributionBatch>>)> {
    current_user.0.require_warehouse()?;
    let batches = service(&state)
        .submit_multi(current_user.0.business_id, current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(batches)))
}

/// Warehouse batch history
pub async fn list_distributions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<BatchFilter>,
) -> AppResult<Json<PaginatedResponse<DistributionBatch>>> {
    current_user.0.require_warehouse()?;
    let batches = service(&state)
        .list_batches(current_user.0.business_id, filter)
        .await?;
    Ok(Json(batches))
}

pub async fn get_distribution(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<String>,
) -> AppResult<Json<DistributionBatch>> {
    current_user.0.require_warehouse()?;
    let batch = service(&state)
        .get_batch(current_user.0.business_id, &batch_id)
        .await?;
    Ok(Json(batch))
}

/// Cancel a pending batch and restock the warehouse
pub async fn cancel_distribution(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<String>,
) -> AppResult<Json<DistributionBatch>> {
    current_user.0.require_warehouse()?;
    let batch = service(&state)
        .cancel_pending(current_user.0.business_id, current_user.0.user_id, &batch_id)
        .await?;
    Ok(Json(batch))
}

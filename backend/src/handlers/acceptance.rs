//! HTTP handlers for the receiving store's pending queue

use axum::{
    extract::{Path, Query, State},
    Json,
};
use shared::{DecisionInput, DecisionOutcome, DistributionBatch, PaginatedResponse};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::acceptance::PendingQuery;
use crate::services::AcceptanceService;
use crate::AppState;

fn service(state: &AppState) -> AcceptanceService {
    AcceptanceService::new(
        state.db.clone(),
        state.config.distribution.clone(),
        state.notifications(),
    )
}

/// Pending batches for a store
pub async fn list_pending(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
    Query(query): Query<PendingQuery>,
) -> AppResult<Json<PaginatedResponse<DistributionBatch>>> {
    current_user.0.require_store(store_id)?;
    let batches = service(&state)
        .list_pending(current_user.0.business_id, store_id, query)
        .await?;
    Ok(Json(batches))
}

pub async fn accept_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
    Json(input): Json<DecisionInput>,
) -> AppResult<Json<DecisionOutcome>> {
    current_user.0.require_receiving(store_id)?;
    let outcome = service(&state)
        .accept(current_user.0.business_id, current_user.0.user_id, store_id, input)
        .await?;
    Ok(Json(outcome))
}

pub async fn reject_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
    Json(input): Json<DecisionInput>,
) -> AppResult<Json<DecisionOutcome>> {
    current_user.0.require_receiving(store_id)?;
    let outcome = service(&state)
        .reject(current_user.0.business_id, current_user.0.user_id, store_id, input)
        .await?;
    Ok(Json(outcome))
}

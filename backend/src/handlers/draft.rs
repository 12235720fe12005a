//! HTTP handlers for draft shipments

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::{DistributionBatch, DraftQuery, SaveDraftInput, SubmitDraftInput, UpdateDraftInput};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{DistributionService, DraftService};
use crate::AppState;

fn service(state: &AppState) -> DraftService {
    DraftService::new(state.db.clone(), state.config.distribution.clone())
}

pub async fn list_drafts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<DraftQuery>,
) -> AppResult<Json<Vec<DistributionBatch>>> {
    current_user.0.require_warehouse()?;
    let drafts = service(&state)
        .list_drafts(current_user.0.business_id, current_user.0.user_id, query)
        .await?;
    Ok(Json(drafts))
}

/// Save a draft, replacing the actor's previous draft for the store
pub async fn save_draft(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<SaveDraftInput>,
) -> AppResult<(StatusCode, Json<DistributionBatch>)> {
    current_user.0.require_warehouse()?;
    let draft = service(&state)
        .save_draft(current_user.0.business_id, current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(draft)))
}

pub async fn update_draft(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<String>,
    Json(input): Json<UpdateDraftInput>,
) -> AppResult<Json<DistributionBatch>> {
    current_user.0.require_warehouse()?;
    let draft = service(&state)
        .update_draft(current_user.0.business_id, current_user.0.user_id, &batch_id, input)
        .await?;
    Ok(Json(draft))
}

pub async fn delete_draft(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<String>,
) -> AppResult<StatusCode> {
    current_user.0.require_warehouse()?;
    service(&state)
        .delete_draft(current_user.0.business_id, current_user.0.user_id, &batch_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Submit a draft as a shipment
pub async fn submit_draft(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<String>,
    input: Option<Json<SubmitDraftInput>>,
) -> AppResult<(StatusCode, Json<DistributionBatch>)> {
    current_user.0.require_warehouse()?;
    let input = input.map(|Json(input)| input).unwrap_or_default();
    let batch = DistributionService::new(
        state.db.clone(),
        state.config.distribution.clone(),
        state.notifications(),
    )
    .submit_draft(current_user.0.business_id, current_user.0.user_id, &batch_id, input)
    .await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

//! HTTP handlers for store returns

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{StockReturn, SubmitReturnInput};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::ReturnService;
use crate::AppState;

fn service(state: &AppState) -> ReturnService {
    ReturnService::new(
        state.db.clone(),
        state.config.distribution.clone(),
        state.notifications(),
    )
}

pub async fn list_returns(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockReturn>>> {
    current_user.0.require_store(store_id)?;
    let returns = service(&state)
        .list_returns(current_user.0.business_id, store_id)
        .await?;
    Ok(Json(returns))
}

/// Send stock from the store back to the warehouse
pub async fn submit_return(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
    Json(input): Json<SubmitReturnInput>,
) -> AppResult<(StatusCode, Json<StockReturn>)> {
    current_user.0.require_store(store_id)?;
    let stock_return = service(&state)
        .submit_return(current_user.0.business_id, current_user.0.user_id, store_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(stock_return)))
}

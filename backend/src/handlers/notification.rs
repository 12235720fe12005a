//! HTTP handlers for store notifications

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::notification::{NotificationQuery, StoreNotification};
use crate::AppState;

pub async fn list_store_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(store_id): Path<Uuid>,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<StoreNotification>>> {
    current_user.0.require_store(store_id)?;
    let notifications = state
        .notifications()
        .list_for_store(current_user.0.business_id, store_id, query.unread_only)
        .await?;
    Ok(Json(notifications))
}

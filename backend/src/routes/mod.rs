//! Route definitions for the RetailHub distribution service

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes. `state` backs the auth layer's secret.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Warehouse shipments
        .nest("/distributions", distribution_routes(&state))
        // Draft shipments
        .nest("/drafts", draft_routes(&state))
        // Ledger reads
        .nest("/stock", stock_routes(&state))
        // Store-side pending queue, returns and notifications
        .nest("/stores", store_routes(&state))
}

/// Distribution routes (protected)
fn distribution_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_distributions).post(handlers::submit_distribution),
        )
        .route("/multi", post(handlers::submit_multi_distribution))
        .route(
            "/:batch_id",
            get(handlers::get_distribution).delete(handlers::cancel_distribution),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Draft routes (protected)
fn draft_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_drafts).post(handlers::save_draft))
        .route(
            "/:batch_id",
            put(handlers::update_draft).delete(handlers::delete_draft),
        )
        .route("/:batch_id/submit", post(handlers::submit_draft))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Stock routes (protected)
fn stock_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/warehouse", get(handlers::warehouse_stock))
        .route("/stores/:store_id", get(handlers::store_stock))
        .route("/movements/:reference", get(handlers::movements))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Store routes (protected)
fn store_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/:store_id/pending", get(handlers::list_pending))
        .route("/:store_id/pending/accept", post(handlers::accept_batch))
        .route("/:store_id/pending/reject", post(handlers::reject_batch))
        .route(
            "/:store_id/returns",
            get(handlers::list_returns).post(handlers::submit_return),
        )
        .route(
            "/:store_id/notifications",
            get(handlers::list_store_notifications),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

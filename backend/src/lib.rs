//! RetailHub distribution service
//!
//! Moves stock from the central warehouse to retail stores and back:
//! shipments, drafts, store acceptance and returns. The binary in `main.rs`
//! only loads settings and serves [`create_app`].

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

use services::{NotificationService, WebhookClient};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub webhook: Option<WebhookClient>,
}

impl AppState {
    /// Notification sink bound to this state's pool and webhook
    pub fn notifications(&self) -> NotificationService {
        NotificationService::new(self.db.clone(), self.webhook.clone())
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn root() -> &'static str {
    "RetailHub Distribution API v1"
}

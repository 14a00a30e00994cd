//! HTTP surface
//!
//! - `POST /api/v1/notifications` takes an object-created notification and
//!   runs it through the pipeline
//! - `GET /health` reports database connectivity

pub mod health;
pub mod notifications;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use stageload_ingest::IngestionOrchestrator;
use std::sync::Arc;

use crate::middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<IngestionOrchestrator>,
    pub db: PgPool,
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let api_v1 = Router::new().route("/notifications", post(notifications::receive_notification));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_v1)
        .with_state(state)
        .layer(middleware::tracing_layer())
}

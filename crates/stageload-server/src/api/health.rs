use axum::{extract::State, Json};
use serde_json::{json, Value};

use super::AppState;
use crate::db;
use crate::error::AppError;

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    db::health_check(&state.db).await?;

    Ok(Json(json!({
        "status": "healthy",
        "database": "connected",
        "tables": state.orchestrator.registry().len(),
    })))
}

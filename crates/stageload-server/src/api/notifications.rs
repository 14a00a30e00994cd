use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use stageload_ingest::{InvocationResponse, Notification, ResponseStatus};
use std::sync::Arc;

use super::AppState;
use crate::error::AppError;

/// Run one notification through the pipeline
///
/// The status code mirrors the invocation result: 200 when every event was
/// loaded or skipped, 400 for a payload without `Records`, 500 when any file
/// failed. A body that is not a notification at all is rejected with 400
/// before the pipeline runs.
///
/// The invocation runs on its own task and finishes even if the caller
/// disconnects, so a relocated file is never left unloaded.
pub async fn receive_notification(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<InvocationResponse>), AppError> {
    let notification: Notification = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed notification: {}", e)))?;

    let orchestrator = Arc::clone(&state.orchestrator);
    let response = tokio::spawn(async move { orchestrator.handle(&notification).await })
        .await
        .map_err(|e| AppError::Internal(format!("Ingestion task failed: {}", e)))?;

    let status = match response.status() {
        ResponseStatus::Success => StatusCode::OK,
        ResponseStatus::ClientError => StatusCode::BAD_REQUEST,
        ResponseStatus::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
    };

    Ok((status, Json(response)))
}

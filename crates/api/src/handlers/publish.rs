//! Handlers for publication jobs.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::queue::EnqueuePublish;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/publish
///
/// Snapshot the requested chapters into one publish job. Publish jobs are
/// handed out before any translate job.
pub async fn enqueue_publish(
    State(state): State<AppState>,
    Json(input): Json<EnqueuePublish>,
) -> AppResult<impl IntoResponse> {
    let receipt = state.queue.enqueue_publish(input).await?;
    Ok(Json(DataResponse { data: receipt }))
}

/// GET /api/v1/publish/status/{project_id}
pub async fn publish_status(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let status = state.queue.publish_status(&project_id).await;
    Ok(Json(DataResponse { data: status }))
}

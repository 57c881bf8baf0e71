//! Handlers for the worker-facing protocol.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use inlands_core::protocol::{AgentLog, Assignment, Submission};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/agent/next-job
///
/// Hands out at most one job, publish before translate, or
/// `{"kind": "empty"}` when both queues are empty.
pub async fn next_job(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let assignment = Assignment::from(state.queue.dequeue_next().await);
    Ok(Json(DataResponse { data: assignment }))
}

/// POST /api/v1/agent/submit
///
/// Merge a worker's outcomes. Outcomes for chapters the project no longer has
/// come back in `unknown_chapters`.
pub async fn submit_result(
    State(state): State<AppState>,
    Json(input): Json<Submission>,
) -> AppResult<impl IntoResponse> {
    let report = state.queue.reconcile(input).await?;
    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/agent/log
///
/// Append a worker progress line to a project's log.
pub async fn append_log(
    State(state): State<AppState>,
    Json(input): Json<AgentLog>,
) -> AppResult<impl IntoResponse> {
    state
        .queue
        .append_log(&input.project_id, input.severity, input.message)
        .await;
    Ok(Json(DataResponse { data: "ok" }))
}

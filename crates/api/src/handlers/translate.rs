//! Handler for enqueueing translate jobs.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::queue::EnqueueTranslate;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/translate
///
/// Batch the requested chapters into translate jobs and mark them
/// `translating`. Chapters already in flight are reported as skipped.
pub async fn enqueue_translate(
    State(state): State<AppState>,
    Json(input): Json<EnqueueTranslate>,
) -> AppResult<impl IntoResponse> {
    let receipt = state.queue.enqueue_translate(input).await?;
    Ok(Json(DataResponse { data: receipt }))
}

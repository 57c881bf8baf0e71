use axum::routing::{get, post};
use axum::Router;

use crate::handlers::publish;
use crate::state::AppState;

/// Routes mounted at `/publish`.
///
/// ```text
/// POST /                       -> enqueue_publish
/// GET  /status/{project_id}    -> publish_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(publish::enqueue_publish))
        .route("/status/{project_id}", get(publish::publish_status))
}

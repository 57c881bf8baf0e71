use axum::routing::post;
use axum::Router;

use crate::handlers::translate;
use crate::state::AppState;

/// Routes mounted at `/translate`.
///
/// ```text
/// POST /   -> enqueue_translate
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(translate::enqueue_translate))
}

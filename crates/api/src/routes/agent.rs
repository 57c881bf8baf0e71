//! Route definitions for the worker protocol.
//!
//! Workers poll `next-job`, run what they get, then `submit` outcomes.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::agent;
use crate::state::AppState;

/// Routes mounted at `/agent`.
///
/// ```text
/// GET  /next-job  -> next_job
/// POST /submit    -> submit_result
/// POST /log       -> append_log
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/next-job", get(agent::next_job))
        .route("/submit", post(agent::submit_result))
        .route("/log", post(agent::append_log))
}

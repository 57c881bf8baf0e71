//! Route definitions for projects.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::projects;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET  /                          -> list_projects
/// POST /                          -> save_project
/// GET  /{id}                      -> get_project
/// GET  /{id}/logs                 -> get_logs
/// POST /{id}/release              -> release_stuck_chapters
/// GET  /{id}/publish-settings     -> get_publish_settings
/// PUT  /{id}/publish-settings     -> save_publish_settings
/// POST /{id}/glossary/replace     -> replace_glossary_term
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::list_projects).post(projects::save_project))
        .route("/{id}", get(projects::get_project))
        .route("/{id}/logs", get(projects::get_logs))
        .route("/{id}/release", post(projects::release_stuck_chapters))
        .route(
            "/{id}/publish-settings",
            get(projects::get_publish_settings).put(projects::save_publish_settings),
        )
        .route("/{id}/glossary/replace", post(projects::replace_glossary_term))
}

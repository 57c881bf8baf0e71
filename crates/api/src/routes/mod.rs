pub mod agent;
pub mod health;
pub mod projects;
pub mod publish;
pub mod translate;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects                                  list, save (upsert)
/// /projects/{id}                             get
/// /projects/{id}/logs                        activity log
/// /projects/{id}/release                     release stuck in-flight chapters
/// /projects/{id}/publish-settings            get, save
/// /projects/{id}/glossary/replace            replace a glossary rendering
///
/// /translate                                 enqueue translate jobs
///
/// /publish                                   enqueue a publish job
/// /publish/status/{project_id}               pending publish jobs
///
/// /agent/next-job                            dequeue one job
/// /agent/submit                              submit job outcomes
/// /agent/log                                 forward a worker log line
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", projects::router())
        .nest("/translate", translate::router())
        .nest("/publish", publish::router())
        // Worker protocol.
        .nest("/agent", agent::router())
}

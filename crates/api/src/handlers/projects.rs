//! Handlers for projects, their glossary, publication settings and logs.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use inlands_core::project::{Project, PublishSettings};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Request body for PUT /projects/{id}/publish-settings.
#[derive(Debug, Deserialize)]
pub struct SavePublishSettings {
    pub book_url: String,
    #[serde(default)]
    pub settings: PublishSettings,
}

/// Request body for POST /projects/{id}/glossary/replace.
#[derive(Debug, Deserialize)]
pub struct ReplaceGlossaryTerm {
    pub original: String,
    pub translation: String,
}

/// Response for POST /projects/{id}/glossary/replace.
#[derive(Debug, Serialize)]
pub struct GlossaryReplaceResponse {
    pub updated_terms: usize,
    /// Always false: existing translations keep the old rendering.
    pub chapters_rewritten: bool,
}

/// Response for POST /projects/{id}/release.
#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub released: usize,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// GET /api/v1/projects
pub async fn list_projects(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let projects = state.queue.list_projects().await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let project = state.queue.get_project(&id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects
///
/// Insert or replace a whole project.
pub async fn save_project(
    State(state): State<AppState>,
    Json(input): Json<Project>,
) -> AppResult<impl IntoResponse> {
    let project = state.queue.save_project(input).await?;
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/v1/projects/{id}/release
///
/// Return chapters stuck in flight to their last good status. Chapters of
/// jobs still waiting in a queue are kept.
pub async fn release_stuck_chapters(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let released = state.queue.release_stuck_chapters(&id).await?;
    Ok(Json(DataResponse {
        data: ReleaseResponse { released },
    }))
}

// ---------------------------------------------------------------------------
// Glossary
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{id}/glossary/replace
///
/// Updates the glossary entry only. Chapters already translated are not
/// rewritten.
pub async fn replace_glossary_term(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ReplaceGlossaryTerm>,
) -> AppResult<impl IntoResponse> {
    if input.original.trim().is_empty() || input.translation.trim().is_empty() {
        return Err(AppError::BadRequest(
            "original and translation must not be empty".to_string(),
        ));
    }

    let updated_terms = state
        .queue
        .replace_glossary_term(&id, &input.original, &input.translation)
        .await?;

    tracing::info!(project_id = %id, term = %input.original, "Glossary term replaced");

    Ok(Json(DataResponse {
        data: GlossaryReplaceResponse {
            updated_terms,
            chapters_rewritten: false,
        },
    }))
}

// ---------------------------------------------------------------------------
// Publication settings
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/publish-settings
pub async fn get_publish_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let view = state.queue.publication_settings(&id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/projects/{id}/publish-settings
pub async fn save_publish_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SavePublishSettings>,
) -> AppResult<impl IntoResponse> {
    let view = state
        .queue
        .save_publication_settings(&id, input.book_url, input.settings)
        .await?;
    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// Logs
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/logs
///
/// Oldest first. Logs live in memory and are lost on restart.
pub async fn get_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let entries = state.queue.logs(&id).await;
    Ok(Json(DataResponse { data: entries }))
}

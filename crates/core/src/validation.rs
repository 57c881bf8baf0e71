//! Request validation shared by the queue service handlers.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::project::Project;

/// At least one chapter id, none blank.
pub fn validate_chapter_ids(ids: &[String]) -> Result<(), CoreError> {
    if ids.is_empty() {
        return Err(CoreError::Validation("chapter_ids must not be empty".into()));
    }
    if ids.iter().any(|id| id.trim().is_empty()) {
        return Err(CoreError::Validation("chapter_ids must not contain blank ids".into()));
    }
    Ok(())
}

/// An absolute http(s) URL.
pub fn validate_target_url(url: &str) -> Result<(), CoreError> {
    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(CoreError::Validation(format!(
            "target_url must be an http(s) URL, got '{url}'"
        )));
    }
    Ok(())
}

/// Non-blank id and name, chapter ids unique within the project.
pub fn validate_project(project: &Project) -> Result<(), CoreError> {
    if project.id.trim().is_empty() {
        return Err(CoreError::Validation("project id must not be empty".into()));
    }
    if project.name.trim().is_empty() {
        return Err(CoreError::Validation("project name must not be empty".into()));
    }

    let mut seen = HashSet::new();
    for chapter in &project.chapters {
        if !seen.insert(chapter.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "duplicate chapter id '{}'",
                chapter.id
            )));
        }
    }
    Ok(())
}

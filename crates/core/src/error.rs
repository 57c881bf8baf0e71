#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl CoreError {
    /// Shorthand for a missing project.
    pub fn project_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "Project",
            id: id.to_string(),
        }
    }
}

//! Persistence for projects.
//!
//! The queue service owns a [`ProjectStore`] and calls it under its own lock,
//! so implementations only need to be internally consistent, not
//! transactional across calls.

pub mod json_store;
pub mod memory_store;

use async_trait::async_trait;
use inlands_core::project::Project;

pub use json_store::JsonFileStore;
pub use memory_store::MemoryStore;

/// Errors from a project store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store document is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Durable storage for projects, keyed by project id.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// All projects in insertion order.
    async fn list(&self) -> Result<Vec<Project>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Project>, StoreError>;

    /// Insert or replace the project with the same id.
    async fn save(&self, project: &Project) -> Result<(), StoreError>;

    /// Verify the backing medium is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;
}

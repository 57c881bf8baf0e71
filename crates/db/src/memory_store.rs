use async_trait::async_trait;
use inlands_core::project::Project;
use tokio::sync::RwLock;

use crate::{ProjectStore, StoreError};

/// Non-durable store, used by tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: RwLock<Vec<Project>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store.
    pub fn with_projects(projects: Vec<Project>) -> Self {
        Self {
            projects: RwLock::new(projects),
        }
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.projects.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Project>, StoreError> {
        Ok(self.projects.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn save(&self, project: &Project) -> Result<(), StoreError> {
        let mut projects = self.projects.write().await;
        match projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project.clone(),
            None => projects.push(project.clone()),
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

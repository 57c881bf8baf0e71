//! Single-file JSON store.
//!
//! All projects live in one document:
//!
//! ```json
//! { "projects": [ { "id": "...", "chapters": [...] }, ... ] }
//! ```
//!
//! The document is cached in memory and rewritten in full on every save, via
//! a sibling temp file and a rename, so a crash mid-write leaves the previous
//! version intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use inlands_core::project::Project;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{ProjectStore, StoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    document: RwLock<Document>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading the document if it exists.
    ///
    /// A missing file is an empty store; it is created on first save.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let document = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Document::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Document::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            projects = document.projects.len(),
            "Opened project store",
        );

        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_document(&self, document: &Document) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.document.read().await.projects.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Project>, StoreError> {
        let document = self.document.read().await;
        Ok(document.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn save(&self, project: &Project) -> Result<(), StoreError> {
        let mut document = self.document.write().await;
        match document.projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project.clone(),
            None => document.projects.push(project.clone()),
        }
        self.write_document(&document).await?;

        tracing::debug!(project_id = %project.id, "Project saved");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::metadata(dir).await?;
        Ok(())
    }
}

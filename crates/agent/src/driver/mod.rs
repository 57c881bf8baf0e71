//! Capability driver interface.
//!
//! A driver operates the external automation surface: it starts a
//! generation from a prompt, lets the caller sample an evolving artifact,
//! and submits finished chapters to a publication target. The worker never
//! knows how the surface is driven.

pub mod remote;
pub mod serialized;

use async_trait::async_trait;
use inlands_core::job::ChapterSnapshot;
use inlands_core::project::PublishSettings;
use serde::{Deserialize, Serialize};

pub use remote::RemoteDriver;
pub use serialized::Serialized;

/// Opaque reference to an artifact that is still being rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactHandle(pub String);

impl std::fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of starting a generation.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// The surface answered synchronously with the final text.
    Finished(String),
    /// The surface is still writing; sample the handle until it settles.
    Evolving(ArtifactHandle),
}

/// What the publication target reported for one chapter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PublishReceipt {
    pub external_id: Option<String>,
    pub url: Option<String>,
}

/// Errors from a capability driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Transport failure talking to the driver.
    #[error("Driver request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The driver returned a non-2xx status code.
    #[error("Driver API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The surface refused the operation.
    #[error("Driver rejected the operation: {0}")]
    Rejected(String),
}

/// Operations the worker needs from the automation surface.
#[async_trait]
pub trait CapabilityDriver: Send + Sync {
    /// Submit a prompt and start generating.
    async fn generate(&self, prompt: &str) -> Result<Artifact, DriverError>;

    /// Read the current content of an evolving artifact.
    async fn sample(&self, handle: &ArtifactHandle) -> Result<String, DriverError>;

    /// Free whatever the surface holds for `handle`.
    async fn release(&self, handle: &ArtifactHandle) -> Result<(), DriverError>;

    /// Submit one chapter to the publication target at `target_url`.
    async fn publish(
        &self,
        target_url: &str,
        chapter: &ChapterSnapshot,
        settings: &PublishSettings,
    ) -> Result<PublishReceipt, DriverError>;
}

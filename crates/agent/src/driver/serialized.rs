//! Mutual exclusion for drivers backed by one shared context.
//!
//! When every slot drives the same browser profile, two operations must not
//! interleave. [`Serialized`] holds a single [`tokio::sync::Mutex`] and takes
//! it around each driver call. Sampling loops still interleave at call
//! granularity, so concurrent slots share the context turn by turn.

use async_trait::async_trait;
use inlands_core::job::ChapterSnapshot;
use inlands_core::project::PublishSettings;
use tokio::sync::Mutex;

use super::{Artifact, ArtifactHandle, CapabilityDriver, DriverError, PublishReceipt};

/// Wraps a driver so at most one of its operations runs at a time.
pub struct Serialized<D> {
    inner: D,
    gate: Mutex<()>,
}

impl<D> Serialized<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: CapabilityDriver> CapabilityDriver for Serialized<D> {
    async fn generate(&self, prompt: &str) -> Result<Artifact, DriverError> {
        let _guard = self.gate.lock().await;
        self.inner.generate(prompt).await
    }

    async fn sample(&self, handle: &ArtifactHandle) -> Result<String, DriverError> {
        let _guard = self.gate.lock().await;
        self.inner.sample(handle).await
    }

    async fn release(&self, handle: &ArtifactHandle) -> Result<(), DriverError> {
        let _guard = self.gate.lock().await;
        self.inner.release(handle).await
    }

    async fn publish(
        &self,
        target_url: &str,
        chapter: &ChapterSnapshot,
        settings: &PublishSettings,
    ) -> Result<PublishReceipt, DriverError> {
        let _guard = self.gate.lock().await;
        self.inner.publish(target_url, chapter, settings).await
    }
}

//! Drives a [`CompletionStrategy`] against an evolving artifact.

use inlands_core::stability::{CompletionStrategy, Verdict};

use crate::driver::{ArtifactHandle, CapabilityDriver};
use crate::error::WorkerError;

/// Sample `handle` until `strategy` reaches a verdict.
///
/// Returns the last readable sample on completion. A sample the driver
/// cannot read counts toward the ceiling but leaves the stability run alone.
pub async fn await_completion<D, S>(
    driver: &D,
    handle: &ArtifactHandle,
    strategy: &mut S,
) -> Result<String, WorkerError>
where
    D: CapabilityDriver + ?Sized,
    S: CompletionStrategy + ?Sized,
{
    let mut latest = String::new();

    loop {
        tokio::time::sleep(strategy.interval()).await;

        let verdict = match driver.sample(handle).await {
            Ok(content) => {
                let verdict = strategy.observe(&content);
                latest = content;
                verdict
            }
            Err(e) => {
                tracing::warn!(handle = %handle, error = %e, "Artifact sample failed");
                strategy.observe_missing()
            }
        };

        match verdict {
            Verdict::Pending => continue,
            Verdict::Complete { reason, samples } => {
                tracing::debug!(handle = %handle, ?reason, samples, "Artifact settled");
                return Ok(latest);
            }
            Verdict::TimedOut { samples } => {
                return Err(WorkerError::DetectionTimeout { samples });
            }
        }
    }
}

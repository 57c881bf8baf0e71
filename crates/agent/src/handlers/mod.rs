//! Job execution, one handler per job kind.
//!
//! A handler never returns early on a chapter failure: every chapter of a
//! job ends up in the submission as either `ok` or `failed`.

pub mod publish;
pub mod translate;

use std::sync::Arc;
use std::time::Duration;

use inlands_core::job::Job;
use inlands_core::log::Severity;
use inlands_core::protocol::{AgentLog, ReconcileReport, Submission};
use inlands_core::stability::StabilityConfig;

use crate::client::{JobSource, QueueClientError};
use crate::driver::CapabilityDriver;
use crate::error::WorkerError;

/// Attempts at delivering one submission before giving up.
pub const SUBMIT_ATTEMPTS: u32 = 3;

/// Pause between delivery attempts.
pub const SUBMIT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Everything a slot needs to run a job.
#[derive(Clone)]
pub struct JobContext {
    pub driver: Arc<dyn CapabilityDriver>,
    pub source: Arc<dyn JobSource>,
    pub stability: StabilityConfig,
    pub submit_retry_delay: Duration,
}

impl JobContext {
    pub fn new(
        driver: Arc<dyn CapabilityDriver>,
        source: Arc<dyn JobSource>,
        stability: StabilityConfig,
    ) -> Self {
        Self {
            driver,
            source,
            stability,
            submit_retry_delay: SUBMIT_RETRY_DELAY,
        }
    }

    /// Forward a line to the project log. Failures are only traced.
    pub async fn report(&self, project_id: &str, severity: Severity, message: impl Into<String>) {
        let entry = AgentLog {
            project_id: project_id.to_string(),
            message: message.into(),
            severity,
        };
        if let Err(e) = self.source.log(&entry).await {
            tracing::warn!(project_id = %project_id, error = %e, "Failed to forward log line");
        }
    }

    /// Deliver a submission, retrying transient failures a few times.
    ///
    /// Reconciliation is idempotent, so a retry after an ambiguous failure
    /// cannot corrupt the stored chapter.
    pub async fn deliver(&self, submission: &Submission) -> Result<ReconcileReport, QueueClientError> {
        let mut attempt = 1;
        loop {
            match self.source.submit(submission).await {
                Ok(report) => {
                    if !report.unknown_chapters.is_empty() {
                        tracing::warn!(
                            project_id = %submission.project_id(),
                            unknown = ?report.unknown_chapters,
                            "Queue service no longer knows some chapters",
                        );
                    }
                    return Ok(report);
                }
                Err(e) if e.is_transient() && attempt < SUBMIT_ATTEMPTS => {
                    tracing::warn!(
                        project_id = %submission.project_id(),
                        attempt,
                        error = %e,
                        "Submit failed, retrying",
                    );
                    attempt += 1;
                    tokio::time::sleep(self.submit_retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Run one job to completion and report its outcomes.
///
/// Chapter failures are reported as outcomes; only a failure to reach the
/// queue service surfaces as an error.
pub async fn execute(ctx: &JobContext, job: Job) -> Result<(), WorkerError> {
    match job {
        Job::Translate(job) => translate::run(ctx, &job).await?,
        Job::Publish(job) => publish::run(ctx, &job).await?,
    }
    Ok(())
}

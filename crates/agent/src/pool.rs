//! Bounded pool of job slots fed by polling the queue service.
//!
//! One long-lived loop ticks at a fixed period. Each tick it drops finished
//! slots and, if a slot is free, asks for at most one job. Running slots are
//! never preempted; on cancellation the loop stops polling, abandoning a
//! poll still waiting on the queue service, and waits for them to finish.

use std::time::Duration;

use inlands_core::job::{Job, JobKind};
use inlands_core::log::Severity;
use inlands_core::protocol::Submission;
use inlands_core::types::{ChapterId, JobId, ProjectId};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::client::Polled;
use crate::error::WorkerError;
use crate::handlers::{self, JobContext};

/// Default number of concurrent slots.
pub const DEFAULT_MAX_SLOTS: usize = 3;

/// Default poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

pub struct WorkerPool {
    ctx: JobContext,
    max_slots: usize,
    poll_interval: Duration,
}

impl WorkerPool {
    pub fn new(ctx: JobContext) -> Self {
        Self {
            ctx,
            max_slots: DEFAULT_MAX_SLOTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the slot count. Values below one are raised to one.
    pub fn with_max_slots(mut self, max_slots: usize) -> Self {
        self.max_slots = max_slots.max(1);
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the poll loop until `cancel` fires, then drain in-flight slots.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut slots: Vec<JoinHandle<()>> = Vec::with_capacity(self.max_slots);
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            max_slots = self.max_slots,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Worker pool started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Worker pool stopping");
                    break;
                }
                _ = ticker.tick() => {
                    slots.retain(|slot| !slot.is_finished());
                    if slots.len() >= self.max_slots {
                        continue;
                    }
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            tracing::info!("Worker pool stopping during a poll");
                            break;
                        }
                        polled = self.poll_once() => {
                            if let Some(slot) = polled {
                                slots.push(slot);
                            }
                        }
                    }
                }
            }
        }

        let in_flight = slots.iter().filter(|slot| !slot.is_finished()).count();
        if in_flight > 0 {
            tracing::info!(in_flight, "Waiting for running jobs to finish");
        }
        for slot in slots {
            if let Err(e) = slot.await {
                tracing::error!(error = %e, "Job slot panicked");
            }
        }
        tracing::info!("Worker pool stopped");
    }

    /// Ask for one job and start a slot for it.
    async fn poll_once(&self) -> Option<JoinHandle<()>> {
        match self.ctx.source.poll().await {
            Ok(Polled::Job(job)) => Some(self.spawn_slot(job)),
            Ok(Polled::Empty) => None,
            Ok(Polled::Unrecognized {
                kind,
                project_id,
                job_id,
                chapter_ids,
            }) => self.drop_assignment(kind, project_id, job_id, chapter_ids).await,
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "Queue service unreachable, retrying next tick");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Poll failed");
                None
            }
        }
    }

    /// Drop an assignment this worker cannot run.
    ///
    /// When the kind is known and the chapters are readable, a slot submits
    /// them as failed so the queue service does not keep them in flight.
    async fn drop_assignment(
        &self,
        kind: String,
        project_id: Option<ProjectId>,
        job_id: Option<JobId>,
        chapter_ids: Vec<ChapterId>,
    ) -> Option<JoinHandle<()>> {
        let known = kind.parse::<JobKind>().ok();
        let err = match known {
            Some(_) => WorkerError::MalformedAssignment(kind),
            None => WorkerError::UnknownJobKind(kind),
        };
        tracing::warn!(project_id = ?project_id, chapters = chapter_ids.len(), error = %err, "Dropping assignment");

        let project_id = project_id?;
        self.ctx
            .report(&project_id, Severity::Warning, format!("Assignment dropped: {err}"))
            .await;

        let kind = known?;
        if chapter_ids.is_empty() {
            return None;
        }
        let submission = Submission::all_failed(kind, project_id, job_id, &chapter_ids, &err.to_string());
        let ctx = self.ctx.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = ctx.deliver(&submission).await {
                tracing::error!(
                    project_id = %submission.project_id(),
                    error = %e,
                    "Failed outcomes for a dropped assignment were not delivered",
                );
            }
        }))
    }

    fn spawn_slot(&self, job: Job) -> JoinHandle<()> {
        let ctx = self.ctx.clone();
        let job_id = job.id();
        let kind = job.kind();
        tracing::info!(job_id = %job_id, kind = %kind, project_id = %job.project_id(), "Job claimed");

        tokio::spawn(async move {
            if let Err(e) = handlers::execute(&ctx, job).await {
                tracing::error!(job_id = %job_id, kind = %kind, error = %e, "Job results were not delivered");
            }
        })
    }
}

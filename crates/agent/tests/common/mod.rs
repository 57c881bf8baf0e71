//! Shared fakes for agent integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use inlands_agent::client::{JobSource, Polled, QueueClientError};
use inlands_agent::driver::{Artifact, ArtifactHandle, CapabilityDriver, DriverError, PublishReceipt};
use inlands_agent::handlers::JobContext;
use inlands_core::job::{new_job_id, ChapterSnapshot, ChapterSource, Job, PublishJob, TranslateJob};
use inlands_core::project::PublishSettings;
use inlands_core::protocol::{AgentLog, ReconcileReport, Submission};
use inlands_core::stability::StabilityConfig;

// ---------------------------------------------------------------------------
// Job source
// ---------------------------------------------------------------------------

/// In-process queue: hands out scripted poll results, records what comes back.
#[derive(Default)]
pub struct FakeSource {
    polls: Mutex<VecDeque<Result<Polled, QueueClientError>>>,
    pub submissions: Mutex<Vec<Submission>>,
    pub logs: Mutex<Vec<AgentLog>>,
    pub submit_attempts: AtomicUsize,
    failing_submits: AtomicUsize,
}

impl FakeSource {
    pub fn with_jobs(jobs: Vec<Job>) -> Self {
        let source = Self::default();
        for job in jobs {
            source.push(Ok(Polled::Job(job)));
        }
        source
    }

    pub fn push(&self, polled: Result<Polled, QueueClientError>) {
        self.polls.lock().unwrap().push_back(polled);
    }

    /// Make the next `n` submit calls fail with a 503.
    pub fn fail_next_submits(&self, n: usize) {
        self.failing_submits.store(n, Ordering::SeqCst);
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn logs(&self) -> Vec<AgentLog> {
        self.logs.lock().unwrap().clone()
    }
}

pub fn unavailable() -> QueueClientError {
    QueueClientError::ApiError {
        status: 503,
        body: "unavailable".into(),
    }
}

#[async_trait]
impl JobSource for FakeSource {
    async fn poll(&self) -> Result<Polled, QueueClientError> {
        self.polls.lock().unwrap().pop_front().unwrap_or(Ok(Polled::Empty))
    }

    async fn submit(&self, submission: &Submission) -> Result<ReconcileReport, QueueClientError> {
        self.submit_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing_submits.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_submits.store(failing - 1, Ordering::SeqCst);
            return Err(unavailable());
        }

        self.submissions.lock().unwrap().push(submission.clone());
        let applied = match submission {
            Submission::Translate { outcomes, .. } => outcomes.len(),
            Submission::Publish { outcomes, .. } => outcomes.len(),
        };
        Ok(ReconcileReport {
            applied,
            unknown_chapters: Vec::new(),
        })
    }

    async fn log(&self, entry: &AgentLog) -> Result<(), QueueClientError> {
        self.logs.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

/// Queue service that accepts the connection and never answers a poll.
pub struct StalledSource;

#[async_trait]
impl JobSource for StalledSource {
    async fn poll(&self) -> Result<Polled, QueueClientError> {
        std::future::pending().await
    }

    async fn submit(&self, _submission: &Submission) -> Result<ReconcileReport, QueueClientError> {
        Ok(ReconcileReport::default())
    }

    async fn log(&self, _entry: &AgentLog) -> Result<(), QueueClientError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// How the scripted driver answers `generate`.
#[derive(Clone, Copy)]
pub enum GenerateMode {
    /// Return the translation synchronously after `delay`.
    Finished { delay: Duration },
    /// Return a handle whose content keeps growing and never settles.
    NeverSettles,
}

/// Driver with scripted behaviour and concurrency accounting.
pub struct ScriptedDriver {
    mode: GenerateMode,
    /// Prompts containing this text fail to generate.
    fail_on: Option<&'static str>,
    active: AtomicUsize,
    pub peak: AtomicUsize,
    growth: AtomicUsize,
    pub released: Mutex<Vec<ArtifactHandle>>,
    /// Receipts handed out by `publish`, one per call; `None` rejects.
    receipts: Mutex<VecDeque<Option<PublishReceipt>>>,
}

impl ScriptedDriver {
    pub fn new(mode: GenerateMode) -> Self {
        Self {
            mode,
            fail_on: None,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            growth: AtomicUsize::new(0),
            released: Mutex::new(Vec::new()),
            receipts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn failing_on(mut self, needle: &'static str) -> Self {
        self.fail_on = Some(needle);
        self
    }

    pub fn with_receipts(self, receipts: Vec<Option<PublishReceipt>>) -> Self {
        *self.receipts.lock().unwrap() = receipts.into();
        self
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CapabilityDriver for ScriptedDriver {
    async fn generate(&self, prompt: &str) -> Result<Artifact, DriverError> {
        if self.fail_on.is_some_and(|needle| prompt.contains(needle)) {
            return Err(DriverError::Rejected("generator refused the prompt".into()));
        }

        match self.mode {
            GenerateMode::Finished { delay } => {
                let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                self.active.fetch_sub(1, Ordering::SeqCst);

                let source = prompt.rsplit("Text:\n").next().unwrap_or_default();
                Ok(Artifact::Finished(format!("EN {source}")))
            }
            GenerateMode::NeverSettles => Ok(Artifact::Evolving(ArtifactHandle("tab-1".into()))),
        }
    }

    async fn sample(&self, _handle: &ArtifactHandle) -> Result<String, DriverError> {
        let n = self.growth.fetch_add(1, Ordering::SeqCst);
        Ok("word ".repeat(50 + n))
    }

    async fn release(&self, handle: &ArtifactHandle) -> Result<(), DriverError> {
        self.released.lock().unwrap().push(handle.clone());
        Ok(())
    }

    async fn publish(
        &self,
        _target_url: &str,
        _chapter: &ChapterSnapshot,
        _settings: &PublishSettings,
    ) -> Result<PublishReceipt, DriverError> {
        match self.receipts.lock().unwrap().pop_front().flatten() {
            Some(receipt) => Ok(receipt),
            None => Err(DriverError::Rejected("chapter editor did not open".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn translate_job(project_id: &str, chapters: &[(&str, &str)]) -> Job {
    Job::Translate(TranslateJob {
        job_id: new_job_id(),
        project_id: project_id.into(),
        prompt: "Translate into English.".into(),
        glossary: Vec::new(),
        chapters: chapters
            .iter()
            .enumerate()
            .map(|(i, (id, text))| ChapterSource {
                id: (*id).into(),
                title: format!("Chapter {}", i + 1),
                number: i as u32 + 1,
                original_text: (*text).into(),
            })
            .collect(),
    })
}

pub fn publish_job(project_id: &str, chapter_ids: &[&str]) -> Job {
    Job::Publish(PublishJob {
        job_id: new_job_id(),
        project_id: project_id.into(),
        target_url: "https://tl.example/book/12".into(),
        settings: PublishSettings::default(),
        chapters: chapter_ids
            .iter()
            .enumerate()
            .map(|(i, id)| ChapterSnapshot {
                id: (*id).into(),
                title: format!("Chapter {}", i + 1),
                number: i as u32 + 1,
                translated_text: "Translated.".into(),
            })
            .collect(),
    })
}

pub fn context(driver: Arc<ScriptedDriver>, source: Arc<FakeSource>) -> JobContext {
    let stability = StabilityConfig {
        interval: Duration::from_secs(1),
        max_samples: 5,
        ..StabilityConfig::fast_settling()
    };
    let mut ctx = JobContext::new(driver, source, stability);
    ctx.submit_retry_delay = Duration::from_millis(100);
    ctx
}

//! The job queue service.
//!
//! Owns two FIFO queues (publish ahead of translate), the project store and
//! the activity log. Every mutation of queues or projects runs under one
//! mutex, store write included, so concurrent requests for the same chapter
//! are applied one after the other.

pub mod logbook;
pub mod reconciler;

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use inlands_core::error::CoreError;
use inlands_core::job::{
    new_job_id, partition_batches, validate_batch_size, ChapterSnapshot, ChapterSource, Job,
    PublishJob, TranslateJob,
};
use inlands_core::log::{LogEntry, Severity};
use inlands_core::project::{Project, PublicationTarget, PublishSettings};
use inlands_core::protocol::{ReconcileReport, Submission};
use inlands_core::status::state_machine::can_transition;
use inlands_core::status::ChapterStatus;
use inlands_core::types::{ChapterId, JobId, ProjectId};
use inlands_core::validation::{validate_chapter_ids, validate_project, validate_target_url};
use inlands_db::{ProjectStore, StoreError};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use self::logbook::LogBook;

/// Errors from queue service operations.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type QueueResult<T> = Result<T, QueueError>;

// ---------------------------------------------------------------------------
// Requests and receipts
// ---------------------------------------------------------------------------

/// Request to translate chapters of a project.
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueTranslate {
    pub project_id: ProjectId,
    pub chapter_ids: Vec<ChapterId>,
    /// Falls back to the project's system prompt.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Falls back to the service default.
    #[serde(default)]
    pub batch_size: Option<usize>,
}

/// Request to publish translated chapters of a project.
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueuePublish {
    pub project_id: ProjectId,
    pub chapter_ids: Vec<ChapterId>,
    /// Falls back to the project's stored publication target.
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub settings: Option<PublishSettings>,
}

/// What an enqueue request did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnqueueReceipt {
    /// Chapters moved into the in-flight state.
    pub queued_count: usize,
    /// One id per job pushed, in queue order.
    pub job_ids: Vec<JobId>,
    /// Requested chapters whose current status does not allow this stage.
    pub skipped: Vec<ChapterId>,
    /// Requested ids the project does not contain.
    pub missing: Vec<ChapterId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueDepths {
    pub translate: usize,
    pub publish: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublishStatus {
    /// Publish jobs for this project still waiting for a worker.
    pub pending_jobs: usize,
    /// Publish jobs waiting across all projects.
    pub total_queue: usize,
}

/// Stored publication target, or the defaults when none is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationSettingsView {
    pub book_url: Option<String>,
    pub settings: PublishSettings,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Queues {
    translate: VecDeque<Job>,
    publish: VecDeque<Job>,
}

pub struct QueueService {
    store: Arc<dyn ProjectStore>,
    queues: Mutex<Queues>,
    logs: LogBook,
    default_batch_size: usize,
}

impl QueueService {
    pub fn new(store: Arc<dyn ProjectStore>, default_batch_size: usize) -> Self {
        Self {
            store,
            queues: Mutex::new(Queues::default()),
            logs: LogBook::new(),
            default_batch_size,
        }
    }

    async fn load(&self, project_id: &str) -> QueueResult<Project> {
        self.store
            .get(project_id)
            .await?
            .ok_or_else(|| CoreError::project_not_found(project_id).into())
    }

    // -- Enqueue ------------------------------------------------------------

    /// Partition the requested chapters, in project order, into translate
    /// jobs of at most `batch_size` and mark them `translating`.
    pub async fn enqueue_translate(&self, request: EnqueueTranslate) -> QueueResult<EnqueueReceipt> {
        validate_chapter_ids(&request.chapter_ids)?;
        let batch_size = request.batch_size.unwrap_or(self.default_batch_size);
        validate_batch_size(batch_size)?;

        let mut queues = self.queues.lock().await;
        let mut project = self.load(&request.project_id).await?;
        let mut receipt = resolve(&project, &request.chapter_ids)?;

        let mut sources = Vec::new();
        for chapter in project
            .chapters
            .iter_mut()
            .filter(|c| request.chapter_ids.contains(&c.id))
        {
            if !can_transition(chapter.status, ChapterStatus::Translating) {
                receipt.skipped.push(chapter.id.clone());
                continue;
            }
            chapter.status = ChapterStatus::Translating;
            chapter.last_error = None;
            sources.push(ChapterSource {
                id: chapter.id.clone(),
                title: chapter.title.clone(),
                number: chapter.number,
                original_text: chapter.original_text.clone(),
            });
        }

        if sources.is_empty() {
            return Ok(receipt);
        }
        receipt.queued_count = sources.len();

        let prompt = request
            .prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| project.system_prompt.clone());

        let jobs: Vec<Job> = partition_batches(sources, batch_size)
            .into_iter()
            .map(|chapters| {
                Job::Translate(TranslateJob {
                    job_id: new_job_id(),
                    project_id: project.id.clone(),
                    prompt: prompt.clone(),
                    glossary: project.glossary.clone(),
                    chapters,
                })
            })
            .collect();

        self.store.save(&project).await?;

        receipt.job_ids = jobs.iter().map(Job::id).collect();
        queues.translate.extend(jobs);

        tracing::info!(
            project_id = %project.id,
            chapters = receipt.queued_count,
            jobs = receipt.job_ids.len(),
            batch_size,
            "Translate jobs enqueued",
        );
        self.logs
            .append(
                &project.id,
                Severity::Info,
                format!(
                    "Queued {} chapters for translation in {} jobs",
                    receipt.queued_count,
                    receipt.job_ids.len()
                ),
            )
            .await;

        Ok(receipt)
    }

    /// Snapshot the requested chapters' translated text into one publish job
    /// and mark them `publishing`.
    pub async fn enqueue_publish(&self, request: EnqueuePublish) -> QueueResult<EnqueueReceipt> {
        validate_chapter_ids(&request.chapter_ids)?;

        let mut queues = self.queues.lock().await;
        let mut project = self.load(&request.project_id).await?;
        let mut receipt = resolve(&project, &request.chapter_ids)?;

        let stored = project.publication.clone();
        let target_url = request
            .target_url
            .or_else(|| stored.as_ref().map(|t| t.book_url.clone()))
            .ok_or_else(|| {
                CoreError::Validation("target_url is required when no publication target is saved".into())
            })?;
        validate_target_url(&target_url)?;
        let settings = request
            .settings
            .or_else(|| stored.map(|t| t.settings))
            .unwrap_or_default();

        let mut snapshots = Vec::new();
        for chapter in project
            .chapters
            .iter_mut()
            .filter(|c| request.chapter_ids.contains(&c.id))
        {
            let text = match &chapter.translated_text {
                Some(text) if can_transition(chapter.status, ChapterStatus::Publishing) => text.clone(),
                _ => {
                    receipt.skipped.push(chapter.id.clone());
                    continue;
                }
            };
            chapter.status = ChapterStatus::Publishing;
            chapter.last_error = None;
            snapshots.push(ChapterSnapshot {
                id: chapter.id.clone(),
                title: chapter.title.clone(),
                number: chapter.number,
                translated_text: text,
            });
        }

        if snapshots.is_empty() {
            return Ok(receipt);
        }
        receipt.queued_count = snapshots.len();

        let job = Job::Publish(PublishJob {
            job_id: new_job_id(),
            project_id: project.id.clone(),
            target_url,
            settings,
            chapters: snapshots,
        });

        self.store.save(&project).await?;

        receipt.job_ids.push(job.id());
        queues.publish.push_back(job);

        tracing::info!(
            project_id = %project.id,
            chapters = receipt.queued_count,
            "Publish job enqueued",
        );
        self.logs
            .append(
                &project.id,
                Severity::Info,
                format!("Queued {} chapters for publication", receipt.queued_count),
            )
            .await;

        Ok(receipt)
    }

    // -- Dequeue ------------------------------------------------------------

    /// Pop the next job: publish queue first, then translate. Never blocks.
    pub async fn dequeue_next(&self) -> Option<Job> {
        let mut queues = self.queues.lock().await;
        let job = queues
            .publish
            .pop_front()
            .or_else(|| queues.translate.pop_front());

        if let Some(job) = &job {
            tracing::info!(
                job_id = %job.id(),
                kind = %job.kind(),
                project_id = job.project_id(),
                chapters = job.chapter_ids().len(),
                "Job dequeued",
            );
        }
        job
    }

    // -- Reconcile ----------------------------------------------------------

    /// Merge a worker's outcomes into the stored chapters.
    ///
    /// Outcomes for chapters the project no longer has are reported back, not
    /// applied. A missing project fails without touching the queues.
    pub async fn reconcile(&self, submission: Submission) -> QueueResult<ReconcileReport> {
        let _queues = self.queues.lock().await;
        let mut project = self.load(submission.project_id()).await?;

        let tally = match &submission {
            Submission::Translate { outcomes, .. } => reconciler::reconcile_translate(&mut project, outcomes),
            Submission::Publish { outcomes, .. } => reconciler::reconcile_publish(&mut project, outcomes),
        };

        if tally.report.applied > 0 {
            self.store.save(&project).await?;
        }

        let (severity, message) = tally.summary(submission.kind());
        tracing::info!(
            project_id = %project.id,
            job_id = ?submission.job_id(),
            kind = %submission.kind(),
            applied = tally.report.applied,
            unknown = tally.report.unknown_chapters.len(),
            "Submission reconciled",
        );
        self.logs.append(&project.id, severity, message).await;

        Ok(tally.report)
    }

    // -- Introspection ------------------------------------------------------

    pub async fn depths(&self) -> QueueDepths {
        let queues = self.queues.lock().await;
        QueueDepths {
            translate: queues.translate.len(),
            publish: queues.publish.len(),
        }
    }

    pub async fn publish_status(&self, project_id: &str) -> PublishStatus {
        let queues = self.queues.lock().await;
        PublishStatus {
            pending_jobs: queues
                .publish
                .iter()
                .filter(|job| job.project_id() == project_id)
                .count(),
            total_queue: queues.publish.len(),
        }
    }

    pub async fn store_healthy(&self) -> bool {
        self.store.health_check().await.is_ok()
    }

    /// Release chapters left in flight by a previous process.
    ///
    /// Queues are not persisted, so at startup no job can still reference a
    /// `translating` or `publishing` chapter. Each one falls back to its last
    /// good status with an error note. Returns the number of chapters released.
    pub async fn release_orphaned_chapters(&self) -> QueueResult<usize> {
        let _queues = self.queues.lock().await;
        let mut released = 0;

        for mut project in self.store.list().await? {
            let changed = release_in_flight(&mut project, &HashSet::new(), "interrupted by a server restart");
            if changed == 0 {
                continue;
            }

            self.store.save(&project).await?;
            self.logs
                .append(
                    &project.id,
                    Severity::Warning,
                    format!("Released {changed} chapters left in flight by a restart"),
                )
                .await;
            released += changed;
        }

        if released > 0 {
            tracing::warn!(released, "Released orphaned in-flight chapters");
        }
        Ok(released)
    }

    /// Release a project's in-flight chapters that no queued job references.
    ///
    /// A claimed job whose worker never delivered its results leaves its
    /// chapters `translating` or `publishing`. Chapters of jobs still waiting in
    /// a queue are left alone. Returns the number of chapters released.
    pub async fn release_stuck_chapters(&self, project_id: &str) -> QueueResult<usize> {
        let queues = self.queues.lock().await;
        let mut project = self.load(project_id).await?;

        let pending: HashSet<&str> = queues
            .translate
            .iter()
            .chain(queues.publish.iter())
            .filter(|job| job.project_id() == project_id)
            .flat_map(Job::chapter_ids)
            .collect();
        let released = release_in_flight(&mut project, &pending, "released after the worker stopped reporting");
        if released == 0 {
            return Ok(0);
        }

        self.store.save(&project).await?;
        tracing::warn!(project_id = %project.id, released, "Released stuck in-flight chapters");
        self.logs
            .append(
                &project.id,
                Severity::Warning,
                format!("Released {released} chapters no job was working on"),
            )
            .await;
        Ok(released)
    }

    // -- Projects -----------------------------------------------------------

    pub async fn list_projects(&self) -> QueueResult<Vec<Project>> {
        Ok(self.store.list().await?)
    }

    pub async fn get_project(&self, project_id: &str) -> QueueResult<Project> {
        self.load(project_id).await
    }

    /// Insert or replace a project.
    ///
    /// Chapter lifecycle fields are owned by the queue: for chapters already
    /// stored, status, translated text, external id and last error are kept.
    pub async fn save_project(&self, mut project: Project) -> QueueResult<Project> {
        validate_project(&project)?;
        let _queues = self.queues.lock().await;
        let stored = self.store.get(&project.id).await?;
        project.keep_lifecycle_from(stored.as_ref());
        self.store.save(&project).await?;
        tracing::info!(project_id = %project.id, chapters = project.chapters.len(), "Project saved");
        Ok(project)
    }

    pub async fn publication_settings(&self, project_id: &str) -> QueueResult<PublicationSettingsView> {
        let project = self.load(project_id).await?;
        Ok(match project.publication {
            Some(target) => PublicationSettingsView {
                book_url: Some(target.book_url),
                settings: target.settings,
            },
            None => PublicationSettingsView {
                book_url: None,
                settings: PublishSettings::default(),
            },
        })
    }

    pub async fn save_publication_settings(
        &self,
        project_id: &str,
        book_url: String,
        settings: PublishSettings,
    ) -> QueueResult<PublicationSettingsView> {
        validate_target_url(&book_url)?;

        let _queues = self.queues.lock().await;
        let mut project = self.load(project_id).await?;
        project.publication = Some(PublicationTarget {
            book_url: book_url.clone(),
            settings: settings.clone(),
        });
        self.store.save(&project).await?;

        self.logs
            .append(project_id, Severity::Info, "Publication settings saved")
            .await;
        Ok(PublicationSettingsView {
            book_url: Some(book_url),
            settings,
        })
    }

    /// Change a glossary rendering. Already translated chapters keep the old
    /// rendering until they are translated again.
    pub async fn replace_glossary_term(
        &self,
        project_id: &str,
        original: &str,
        translation: &str,
    ) -> QueueResult<usize> {
        let _queues = self.queues.lock().await;
        let mut project = self.load(project_id).await?;

        let changed = project.replace_glossary_term(original, translation);
        if changed == 0 {
            return Err(CoreError::NotFound {
                entity: "GlossaryTerm",
                id: original.to_string(),
            }
            .into());
        }
        self.store.save(&project).await?;

        self.logs
            .append(
                project_id,
                Severity::Success,
                format!("Glossary term '{original}' now renders as '{translation}'"),
            )
            .await;
        Ok(changed)
    }

    // -- Logs ---------------------------------------------------------------

    pub async fn logs(&self, project_id: &str) -> Vec<LogEntry> {
        self.logs.entries(project_id).await
    }

    pub async fn append_log(&self, project_id: &str, severity: Severity, message: impl Into<String>) {
        self.logs.append(project_id, severity, message).await;
    }
}

/// Return in-flight chapters outside `pending` to their last good status.
fn release_in_flight(project: &mut Project, pending: &HashSet<&str>, reason: &str) -> usize {
    let mut released = 0;
    for chapter in project
        .chapters
        .iter_mut()
        .filter(|c| c.status.is_in_flight() && !pending.contains(c.id.as_str()))
    {
        chapter.status = match chapter.status {
            ChapterStatus::Publishing => ChapterStatus::Completed,
            _ => chapter.last_good_status(),
        };
        chapter.last_error = Some(reason.to_string());
        released += 1;
    }
    released
}

/// Split requested ids into present and missing. Fails when none are present.
fn resolve(project: &Project, requested: &[ChapterId]) -> QueueResult<EnqueueReceipt> {
    let present: HashSet<&str> = project.chapters.iter().map(|c| c.id.as_str()).collect();
    let missing: Vec<ChapterId> = requested
        .iter()
        .filter(|id| !present.contains(id.as_str()))
        .cloned()
        .collect();

    if missing.len() == requested.len() {
        return Err(CoreError::NotFound {
            entity: "Chapter",
            id: requested.join(","),
        }
        .into());
    }

    Ok(EnqueueReceipt {
        missing,
        ..EnqueueReceipt::default()
    })
}

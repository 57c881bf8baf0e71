//! Wire types exchanged between the queue service and workers.
//!
//! ```text
//! worker                           queue service
//!   | GET  /agent/next-job             |
//!   |<------- Assignment --------------|   translate | publish | empty
//!   | POST /agent/submit  Submission   |
//!   |------------------------------->  |
//!   |<------- ReconcileReport ---------|
//!   | POST /agent/log     AgentLog     |
//! ```

use serde::{Deserialize, Serialize};

use crate::job::{Job, JobKind, PublishJob, TranslateJob};
use crate::log::Severity;
use crate::types::{ChapterId, JobId, ProjectId};

// ---------------------------------------------------------------------------
// Dequeue
// ---------------------------------------------------------------------------

/// Response to a dequeue request.
///
/// Kinds this build does not know about deserialize to [`Assignment::Unknown`]
/// instead of failing, so a newer server cannot wedge an older worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assignment {
    Translate(TranslateJob),
    Publish(PublishJob),
    /// Both queues are empty.
    Empty,
    #[serde(other)]
    Unknown,
}

impl From<Option<Job>> for Assignment {
    fn from(job: Option<Job>) -> Self {
        match job {
            Some(Job::Translate(job)) => Self::Translate(job),
            Some(Job::Publish(job)) => Self::Publish(job),
            None => Self::Empty,
        }
    }
}

impl Assignment {
    /// The runnable job, if this assignment carries one.
    pub fn into_job(self) -> Option<Job> {
        match self {
            Self::Translate(job) => Some(Job::Translate(job)),
            Self::Publish(job) => Some(Job::Publish(job)),
            Self::Empty | Self::Unknown => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A worker's report for one job (or part of one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Submission {
    Translate {
        project_id: ProjectId,
        #[serde(default)]
        job_id: Option<JobId>,
        outcomes: Vec<TranslateOutcome>,
    },
    Publish {
        project_id: ProjectId,
        #[serde(default)]
        job_id: Option<JobId>,
        outcomes: Vec<PublishOutcome>,
    },
}

impl Submission {
    /// Fail every listed chapter of a job with the same error.
    pub fn all_failed(
        kind: JobKind,
        project_id: impl Into<ProjectId>,
        job_id: Option<JobId>,
        chapter_ids: &[ChapterId],
        error: &str,
    ) -> Self {
        let project_id = project_id.into();
        match kind {
            JobKind::Translate => Self::Translate {
                project_id,
                job_id,
                outcomes: chapter_ids
                    .iter()
                    .map(|id| TranslateOutcome::failed(id.as_str(), error))
                    .collect(),
            },
            JobKind::Publish => Self::Publish {
                project_id,
                job_id,
                outcomes: chapter_ids
                    .iter()
                    .map(|id| PublishOutcome::failed(id.as_str(), error))
                    .collect(),
            },
        }
    }

    pub fn kind(&self) -> JobKind {
        match self {
            Self::Translate { .. } => JobKind::Translate,
            Self::Publish { .. } => JobKind::Publish,
        }
    }

    pub fn project_id(&self) -> &str {
        match self {
            Self::Translate { project_id, .. } | Self::Publish { project_id, .. } => project_id,
        }
    }

    pub fn job_id(&self) -> Option<JobId> {
        match self {
            Self::Translate { job_id, .. } | Self::Publish { job_id, .. } => *job_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateOutcome {
    pub chapter_id: ChapterId,
    #[serde(flatten)]
    pub result: TranslateResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TranslateResult {
    Ok { translated_text: String },
    Failed { error: String },
}

impl TranslateOutcome {
    pub fn ok(chapter_id: impl Into<ChapterId>, translated_text: impl Into<String>) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            result: TranslateResult::Ok {
                translated_text: translated_text.into(),
            },
        }
    }

    pub fn failed(chapter_id: impl Into<ChapterId>, error: impl Into<String>) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            result: TranslateResult::Failed { error: error.into() },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.result, TranslateResult::Ok { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub chapter_id: ChapterId,
    #[serde(flatten)]
    pub result: PublishResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishResult {
    Ok {
        #[serde(default)]
        external_id: Option<String>,
    },
    Failed { error: String },
}

impl PublishOutcome {
    pub fn ok(chapter_id: impl Into<ChapterId>, external_id: Option<String>) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            result: PublishResult::Ok { external_id },
        }
    }

    pub fn failed(chapter_id: impl Into<ChapterId>, error: impl Into<String>) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            result: PublishResult::Failed { error: error.into() },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.result, PublishResult::Ok { .. })
    }
}

/// What the queue service did with a [`Submission`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Outcomes applied to existing chapters.
    pub applied: usize,
    /// Chapter ids in the submission that the project no longer has.
    pub unknown_chapters: Vec<ChapterId>,
}

// ---------------------------------------------------------------------------
// Worker log forwarding
// ---------------------------------------------------------------------------

/// A progress line a worker wants shown in a project's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentLog {
    pub project_id: ProjectId,
    pub message: String,
    #[serde(default)]
    pub severity: Severity,
}

//! Typed job records handed from the queue service to workers.
//!
//! A job is immutable once enqueued: it carries snapshots of everything the
//! worker needs (chapter text, glossary, settings), so later edits to the
//! project never change work already in the queue.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::project::{GlossaryTerm, PublishSettings};
use crate::types::{ChapterId, JobId, ProjectId};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Chapters per translate job when the caller does not choose.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Upper bound on a caller-chosen batch size.
pub const MAX_BATCH_SIZE: usize = 50;

// ---------------------------------------------------------------------------
// Job types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Translate,
    Publish,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Translate => "translate",
            Self::Publish => "publish",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "translate" => Ok(Self::Translate),
            "publish" => Ok(Self::Publish),
            other => Err(CoreError::Validation(format!("Unknown job kind: {other}"))),
        }
    }
}

/// A unit of work, discriminated on the wire by its `kind` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    Translate(TranslateJob),
    Publish(PublishJob),
}

/// Translate a batch of chapters with one prompt and glossary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateJob {
    pub job_id: JobId,
    pub project_id: ProjectId,
    pub prompt: String,
    pub glossary: Vec<GlossaryTerm>,
    pub chapters: Vec<ChapterSource>,
}

/// Source text of a chapter as captured at enqueue time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterSource {
    pub id: ChapterId,
    pub title: String,
    pub number: u32,
    pub original_text: String,
}

/// Publish translated chapters to an external target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishJob {
    pub job_id: JobId,
    pub project_id: ProjectId,
    pub target_url: String,
    pub settings: PublishSettings,
    pub chapters: Vec<ChapterSnapshot>,
}

/// Translated text of a chapter as captured at enqueue time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterSnapshot {
    pub id: ChapterId,
    pub title: String,
    pub number: u32,
    pub translated_text: String,
}

impl Job {
    pub fn kind(&self) -> JobKind {
        match self {
            Self::Translate(_) => JobKind::Translate,
            Self::Publish(_) => JobKind::Publish,
        }
    }

    pub fn id(&self) -> JobId {
        match self {
            Self::Translate(job) => job.job_id,
            Self::Publish(job) => job.job_id,
        }
    }

    pub fn project_id(&self) -> &str {
        match self {
            Self::Translate(job) => &job.project_id,
            Self::Publish(job) => &job.project_id,
        }
    }

    pub fn chapter_ids(&self) -> Vec<&str> {
        match self {
            Self::Translate(job) => job.chapters.iter().map(|c| c.id.as_str()).collect(),
            Self::Publish(job) => job.chapters.iter().map(|c| c.id.as_str()).collect(),
        }
    }
}

/// A fresh time-ordered job id.
pub fn new_job_id() -> JobId {
    uuid::Uuid::now_v7()
}

// ---------------------------------------------------------------------------
// Batching
// ---------------------------------------------------------------------------

/// Split `items` into consecutive batches of at most `batch_size`,
/// preserving order. Yields `ceil(len / batch_size)` batches.
pub fn partition_batches<T>(items: Vec<T>, batch_size: usize) -> Vec<Vec<T>> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(items.len().div_ceil(batch_size));
    let mut current = Vec::with_capacity(batch_size);

    for item in items {
        current.push(item);
        if current.len() == batch_size {
            batches.push(std::mem::replace(&mut current, Vec::with_capacity(batch_size)));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Validate a caller-chosen batch size.
pub fn validate_batch_size(batch_size: usize) -> Result<(), CoreError> {
    if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
        return Err(CoreError::Validation(format!(
            "batch_size must be between 1 and {MAX_BATCH_SIZE}, got {batch_size}"
        )));
    }
    Ok(())
}

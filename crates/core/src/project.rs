//! Projects, their chapters, glossary and publication settings.

use serde::{Deserialize, Serialize};

use crate::status::ChapterStatus;
use crate::types::{ChapterId, ProjectId, Timestamp};

/// A translation project: an ordered list of chapters plus the glossary and
/// prompt used to translate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub glossary: Vec<GlossaryTerm>,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default = "chrono::Utc::now")]
    pub created_at: Timestamp,
    /// Where and how chapters get published, if configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication: Option<PublicationTarget>,
}

/// One chapter of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub title: String,
    pub number: u32,
    pub original_text: String,
    #[serde(default)]
    pub translated_text: Option<String>,
    #[serde(default)]
    pub status: ChapterStatus,
    /// Identifier assigned by the publication target.
    #[serde(default)]
    pub external_id: Option<String>,
    /// Message from the most recent failed attempt, cleared on success.
    #[serde(default)]
    pub last_error: Option<String>,
}

/// A fixed rendering for a source-language term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub original: String,
    pub translation: String,
}

/// Stored publication target for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationTarget {
    pub book_url: String,
    #[serde(default)]
    pub settings: PublishSettings,
}

/// Options passed through to the publication target for each chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    /// Target-side chapter state, e.g. `"ready"` or `"draft"`.
    pub chapter_status: String,
    pub delayed_chapter: bool,
    pub subscription_only: bool,
    pub add_as_translation: bool,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            chapter_status: "ready".to_string(),
            delayed_chapter: true,
            subscription_only: true,
            add_as_translation: true,
        }
    }
}

impl Project {
    /// Create an empty project with the given id and name.
    pub fn new(id: impl Into<ProjectId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            chapters: Vec::new(),
            glossary: Vec::new(),
            system_prompt: String::new(),
            created_at: chrono::Utc::now(),
            publication: None,
        }
    }

    pub fn chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    pub fn chapter_mut(&mut self, id: &str) -> Option<&mut Chapter> {
        self.chapters.iter_mut().find(|c| c.id == id)
    }

    /// Carry chapter lifecycle state over from the stored copy of this project.
    ///
    /// Status, translated text, external id and last error only change through
    /// the queue, so an incoming save never overrides them for chapters the
    /// stored copy already has. A chapter new to the project may not start in
    /// flight; it falls back to its last good status.
    pub fn keep_lifecycle_from(&mut self, stored: Option<&Project>) {
        for chapter in &mut self.chapters {
            match stored.and_then(|p| p.chapter(&chapter.id)) {
                Some(existing) => {
                    chapter.status = existing.status;
                    chapter.translated_text = existing.translated_text.clone();
                    chapter.external_id = existing.external_id.clone();
                    chapter.last_error = existing.last_error.clone();
                }
                None if chapter.status.is_in_flight() => {
                    chapter.status = chapter.last_good_status();
                }
                None => {}
            }
        }
    }

    /// Replace the rendering of every glossary entry whose original matches
    /// `original`. Returns the number of entries changed.
    ///
    /// Translated chapter text is left untouched: chapters translated with the
    /// old rendering keep it until they are translated again.
    pub fn replace_glossary_term(&mut self, original: &str, translation: &str) -> usize {
        let mut changed = 0;
        for term in self.glossary.iter_mut().filter(|t| t.original == original) {
            term.translation = translation.to_string();
            changed += 1;
        }
        changed
    }
}

impl Chapter {
    /// A fresh chapter in the `queued` state.
    pub fn new(
        id: impl Into<ChapterId>,
        number: u32,
        title: impl Into<String>,
        original_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            number,
            original_text: original_text.into(),
            translated_text: None,
            status: ChapterStatus::Queued,
            external_id: None,
            last_error: None,
        }
    }

    /// The status to fall back to when a translate attempt fails.
    pub fn last_good_status(&self) -> ChapterStatus {
        if self.translated_text.is_some() {
            ChapterStatus::Completed
        } else {
            ChapterStatus::Queued
        }
    }
}

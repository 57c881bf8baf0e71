//! Merging worker outcomes into stored chapters.
//!
//! Every function here is last-write-wins: applying the same outcome twice
//! leaves the chapter exactly as applying it once.

use inlands_core::job::JobKind;
use inlands_core::log::Severity;
use inlands_core::project::{Chapter, Project};
use inlands_core::protocol::{PublishOutcome, PublishResult, ReconcileReport, TranslateOutcome, TranslateResult};
use inlands_core::status::ChapterStatus;

/// Apply a translate outcome to its chapter.
pub fn apply_translate(chapter: &mut Chapter, result: &TranslateResult) {
    match result {
        TranslateResult::Ok { translated_text } => {
            chapter.translated_text = Some(translated_text.clone());
            chapter.status = ChapterStatus::Completed;
            chapter.last_error = None;
        }
        TranslateResult::Failed { error } => {
            chapter.status = chapter.last_good_status();
            chapter.last_error = Some(error.clone());
        }
    }
}

/// Apply a publish outcome to its chapter.
pub fn apply_publish(chapter: &mut Chapter, result: &PublishResult) {
    match result {
        PublishResult::Ok { external_id } => {
            chapter.status = ChapterStatus::Published;
            if external_id.is_some() {
                chapter.external_id = external_id.clone();
            }
            chapter.last_error = None;
        }
        PublishResult::Failed { error } => {
            chapter.status = ChapterStatus::Completed;
            chapter.last_error = Some(error.clone());
        }
    }
}

/// Tally of one submission, used for the project log line.
#[derive(Debug, Default)]
pub struct Tally {
    pub succeeded: usize,
    pub failed: Vec<String>,
    pub report: ReconcileReport,
}

pub fn reconcile_translate(project: &mut Project, outcomes: &[TranslateOutcome]) -> Tally {
    let mut tally = Tally::default();
    for outcome in outcomes {
        let Some(chapter) = project.chapter_mut(&outcome.chapter_id) else {
            tally.report.unknown_chapters.push(outcome.chapter_id.clone());
            continue;
        };
        apply_translate(chapter, &outcome.result);
        tally.record(chapter, outcome.is_ok());
    }
    tally
}

pub fn reconcile_publish(project: &mut Project, outcomes: &[PublishOutcome]) -> Tally {
    let mut tally = Tally::default();
    for outcome in outcomes {
        let Some(chapter) = project.chapter_mut(&outcome.chapter_id) else {
            tally.report.unknown_chapters.push(outcome.chapter_id.clone());
            continue;
        };
        apply_publish(chapter, &outcome.result);
        tally.record(chapter, outcome.is_ok());
    }
    tally
}

impl Tally {
    fn record(&mut self, chapter: &Chapter, ok: bool) {
        self.report.applied += 1;
        if ok {
            self.succeeded += 1;
        } else {
            let reason = chapter.last_error.as_deref().unwrap_or("unknown error");
            self.failed.push(format!("{}: {reason}", chapter.title));
        }
    }

    /// Severity and message summarizing the submission.
    pub fn summary(&self, kind: JobKind) -> (Severity, String) {
        let verb = match kind {
            JobKind::Translate => "Translated",
            JobKind::Publish => "Published",
        };
        let total = self.succeeded + self.failed.len();

        let mut message = format!("{verb} {} of {total} chapters", self.succeeded);
        if !self.failed.is_empty() {
            message.push_str(&format!("; failed: {}", self.failed.join(", ")));
        }
        if !self.report.unknown_chapters.is_empty() {
            message.push_str(&format!(
                "; unknown chapters ignored: {}",
                self.report.unknown_chapters.join(", ")
            ));
        }

        let severity = if self.failed.is_empty() && self.report.unknown_chapters.is_empty() && total > 0 {
            Severity::Success
        } else if self.succeeded > 0 {
            Severity::Warning
        } else {
            Severity::Error
        };
        (severity, message)
    }
}

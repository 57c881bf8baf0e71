//! Chapter lifecycle status and its state machine.
//!
//! ```text
//! queued -> translating -> completed -> publishing -> published
//!              |                ^           |
//!              +-> queued       +-----------+  (failed publish)
//! ```
//!
//! Enqueue operations consult the state machine to decide whether a chapter
//! may enter an in-flight state. Submitted results are applied
//! last-write-wins and do not go through it.

use serde::{Deserialize, Serialize};

/// The single status carried by every chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterStatus {
    /// Imported, never translated (or last translation attempt failed).
    #[default]
    Queued,
    /// Part of a translate job that has not reported back yet.
    Translating,
    /// Translated text is present.
    Completed,
    /// Part of a publish job that has not reported back yet.
    Publishing,
    /// Accepted by the publication target.
    Published,
}

impl ChapterStatus {
    /// Lower-case wire name, as used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Translating => "translating",
            Self::Completed => "completed",
            Self::Publishing => "publishing",
            Self::Published => "published",
        }
    }

    /// Whether a job for this chapter is currently outstanding.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Translating | Self::Publishing)
    }
}

impl std::fmt::Display for ChapterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub mod state_machine {
    use super::ChapterStatus::{self, *};

    /// Returns the statuses reachable from `from`.
    pub fn valid_transitions(from: ChapterStatus) -> &'static [ChapterStatus] {
        match from {
            Queued => &[Translating],
            // Success, or failure without any earlier translation.
            Translating => &[Completed, Queued],
            Completed => &[Translating, Publishing],
            // Success, or failure back to the last good status.
            Publishing => &[Published, Completed],
            Published => &[Translating, Publishing],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: ChapterStatus, to: ChapterStatus) -> bool {
        valid_transitions(from).contains(&to)
    }
}

#[cfg(test)]
mod tests {
    use super::state_machine::*;
    use super::ChapterStatus::*;
    use super::*;

    // -----------------------------------------------------------------------
    // Valid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn queued_to_translating() {
        assert!(can_transition(Queued, Translating));
    }

    #[test]
    fn translating_to_completed() {
        assert!(can_transition(Translating, Completed));
    }

    #[test]
    fn translating_back_to_queued_on_failure() {
        assert!(can_transition(Translating, Queued));
    }

    #[test]
    fn completed_to_publishing() {
        assert!(can_transition(Completed, Publishing));
    }

    #[test]
    fn completed_can_be_retranslated() {
        assert!(can_transition(Completed, Translating));
    }

    #[test]
    fn publishing_to_published() {
        assert!(can_transition(Publishing, Published));
    }

    #[test]
    fn publishing_back_to_completed_on_failure() {
        assert!(can_transition(Publishing, Completed));
    }

    #[test]
    fn published_can_be_republished() {
        assert!(can_transition(Published, Publishing));
    }

    // -----------------------------------------------------------------------
    // Invalid transitions
    // -----------------------------------------------------------------------

    #[test]
    fn queued_cannot_publish() {
        assert!(!can_transition(Queued, Publishing));
    }

    #[test]
    fn translating_cannot_be_requeued_for_translation() {
        assert!(!can_transition(Translating, Translating));
    }

    #[test]
    fn publishing_cannot_start_translation() {
        assert!(!can_transition(Publishing, Translating));
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    #[test]
    fn serializes_as_snake_case() {
        let json = serde_json::to_string(&Translating).unwrap();
        assert_eq!(json, "\"translating\"");
    }

    #[test]
    fn in_flight_states() {
        assert!(Translating.is_in_flight());
        assert!(Publishing.is_in_flight());
        assert!(!Completed.is_in_flight());
        assert!(!ChapterStatus::default().is_in_flight());
    }
}

//! Per-project activity log entries.

use serde::{Deserialize, Serialize};

use crate::types::{ProjectId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// One line of a project's activity log. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub project_id: ProjectId,
    pub timestamp: Timestamp,
    pub message: String,
    pub severity: Severity,
}

impl LogEntry {
    pub fn new(project_id: impl Into<ProjectId>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            timestamp: chrono::Utc::now(),
            message: message.into(),
            severity,
        }
    }
}

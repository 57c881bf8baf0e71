//! In-memory, per-project activity log.

use std::collections::{HashMap, VecDeque};

use inlands_core::log::{LogEntry, Severity};
use inlands_core::types::ProjectId;
use tokio::sync::RwLock;

/// Entries kept per project before the oldest are dropped.
pub const MAX_ENTRIES_PER_PROJECT: usize = 1000;

/// Bounded log entries grouped by project. Not persisted.
#[derive(Debug)]
pub struct LogBook {
    entries: RwLock<HashMap<ProjectId, VecDeque<LogEntry>>>,
    limit: usize,
}

impl Default for LogBook {
    fn default() -> Self {
        Self::with_limit(MAX_ENTRIES_PER_PROJECT)
    }
}

impl LogBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `limit` entries per project (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            limit: limit.max(1),
        }
    }

    /// Append an entry and mirror it to tracing.
    pub async fn append(&self, project_id: &str, severity: Severity, message: impl Into<String>) {
        let entry = LogEntry::new(project_id, severity, message);

        match severity {
            Severity::Error => tracing::warn!(project_id, message = %entry.message, "Project log"),
            _ => tracing::info!(project_id, message = %entry.message, "Project log"),
        }

        let mut entries = self.entries.write().await;
        let log = entries.entry(project_id.to_string()).or_default();
        if log.len() == self.limit {
            log.pop_front();
        }
        log.push_back(entry);
    }

    /// All retained entries for a project, oldest first.
    pub async fn entries(&self, project_id: &str) -> Vec<LogEntry> {
        self.entries
            .read()
            .await
            .get(project_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Project identifiers are caller-chosen strings (usually UUIDs).
pub type ProjectId = String;

/// Chapter identifiers are unique within their project.
pub type ChapterId = String;

/// Jobs are identified by time-ordered UUIDs.
pub type JobId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

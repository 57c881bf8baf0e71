//! HTTP client for the queue service's worker protocol.
//!
//! Wraps `next-job`, `submit` and `log` using [`reqwest`]. The pool talks to
//! it through the [`JobSource`] trait so tests can substitute an in-process
//! queue.

use std::time::Duration;

use async_trait::async_trait;
use inlands_core::job::Job;
use inlands_core::protocol::{AgentLog, Assignment, ReconcileReport, Submission};
use inlands_core::types::{ChapterId, JobId, ProjectId};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Errors from the queue service client.
#[derive(Debug, thiserror::Error)]
pub enum QueueClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The queue service returned a non-2xx status code.
    #[error("Queue service error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl QueueClientError {
    /// Worth retrying on the next poll: the service was unreachable or
    /// briefly unhealthy.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::ApiError { status, .. } => *status >= 500,
        }
    }
}

/// One poll result.
#[derive(Debug, Clone, PartialEq)]
pub enum Polled {
    Job(Job),
    Empty,
    /// An assignment this worker cannot run: unknown kind or malformed payload.
    ///
    /// Carries whatever identifying fields could still be read so the
    /// affected chapters can be failed instead of left in flight.
    Unrecognized {
        kind: String,
        project_id: Option<ProjectId>,
        job_id: Option<JobId>,
        chapter_ids: Vec<ChapterId>,
    },
}

impl Polled {
    /// Classify a raw `next-job` payload.
    pub fn from_value(value: serde_json::Value) -> Self {
        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .unwrap_or("<missing>")
            .to_string();
        let project_id = value
            .get("project_id")
            .and_then(|p| p.as_str())
            .map(str::to_string);
        let job_id: Option<JobId> = value
            .get("job_id")
            .and_then(|id| id.as_str())
            .and_then(|id| id.parse().ok());
        let chapter_ids: Vec<ChapterId> = value
            .get("chapters")
            .and_then(|c| c.as_array())
            .map(|chapters| {
                chapters
                    .iter()
                    .filter_map(|c| c.get("id").and_then(|id| id.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let unrecognized = |kind, project_id| Self::Unrecognized {
            kind,
            project_id,
            job_id,
            chapter_ids,
        };

        match serde_json::from_value::<Assignment>(value) {
            Ok(Assignment::Empty) => Self::Empty,
            Ok(assignment) => match assignment.into_job() {
                Some(job) => Self::Job(job),
                None => unrecognized(kind, project_id),
            },
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Malformed assignment");
                unrecognized(kind, project_id)
            }
        }
    }
}

/// Where workers get jobs and send results.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Ask for at most one job.
    async fn poll(&self) -> Result<Polled, QueueClientError>;

    /// Report outcomes for a job.
    async fn submit(&self, submission: &Submission) -> Result<ReconcileReport, QueueClientError>;

    /// Forward a progress line to the project log.
    async fn log(&self, entry: &AgentLog) -> Result<(), QueueClientError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Default bound on one `next-job` request.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on one `submit` or `log` request.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for one queue service.
pub struct QueueClient {
    client: reqwest::Client,
    base_url: String,
    poll_timeout: Duration,
    submit_timeout: Duration,
}

impl QueueClient {
    /// Create a client for the service at `base_url`, e.g. `http://host:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
        }
    }

    /// Bound each poll, and each submit or log request, to a total duration.
    pub fn with_timeouts(mut self, poll: Duration, submit: Duration) -> Self {
        self.poll_timeout = poll;
        self.submit_timeout = submit;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/agent/{path}", self.base_url)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, QueueClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(QueueClientError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful `{ "data": T }` response.
    async fn parse_data<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, QueueClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Envelope<T>>().await?.data)
    }
}

#[async_trait]
impl JobSource for QueueClient {
    async fn poll(&self) -> Result<Polled, QueueClientError> {
        let response = self
            .client
            .get(self.url("next-job"))
            .timeout(self.poll_timeout)
            .send()
            .await?;
        let value: serde_json::Value = Self::parse_data(response).await?;
        Ok(Polled::from_value(value))
    }

    async fn submit(&self, submission: &Submission) -> Result<ReconcileReport, QueueClientError> {
        let response = self
            .client
            .post(self.url("submit"))
            .timeout(self.submit_timeout)
            .json(submission)
            .send()
            .await?;
        Self::parse_data(response).await
    }

    async fn log(&self, entry: &AgentLog) -> Result<(), QueueClientError> {
        let response = self
            .client
            .post(self.url("log"))
            .timeout(self.submit_timeout)
            .json(entry)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}

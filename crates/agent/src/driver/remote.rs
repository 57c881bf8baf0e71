//! HTTP client for the automation sidecar.
//!
//! The sidecar owns the browser session. This driver only speaks its small
//! REST surface using [`reqwest`]:
//!
//! | method   | path                   | purpose                          |
//! |----------|------------------------|----------------------------------|
//! | `POST`   | `/generate`            | start a generation from a prompt |
//! | `GET`    | `/artifacts/{handle}`  | read the current rendering       |
//! | `DELETE` | `/artifacts/{handle}`  | close the rendering              |
//! | `POST`   | `/publish`             | submit one chapter to a target   |

use std::time::Duration;

use async_trait::async_trait;
use inlands_core::job::ChapterSnapshot;
use inlands_core::project::PublishSettings;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Artifact, ArtifactHandle, CapabilityDriver, DriverError, PublishReceipt};

/// Default bound on one sidecar request, publication included.
pub const DEFAULT_DRIVER_TIMEOUT: Duration = Duration::from_secs(120);

/// Driver backed by an automation sidecar reachable over HTTP.
pub struct RemoteDriver {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

/// Response of `POST /generate`.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum GenerateResponse {
    Finished { text: String },
    Evolving { handle: ArtifactHandle },
}

#[derive(Debug, Deserialize)]
struct SampleResponse {
    content: String,
}

#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    target_url: &'a str,
    chapter: &'a ChapterSnapshot,
    settings: &'a PublishSettings,
}

/// Response of `POST /publish`.
#[derive(Debug, Deserialize)]
struct PublishResponse {
    success: bool,
    #[serde(default)]
    external_id: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl RemoteDriver {
    /// Create a driver for the sidecar at `base_url`, e.g. `http://host:9333`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a driver reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            timeout: DEFAULT_DRIVER_TIMEOUT,
        }
    }

    /// Bound each sidecar request to `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn artifact_url(&self, handle: &ArtifactHandle) -> String {
        format!("{}/artifacts/{}", self.base_url, handle)
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, DriverError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DriverError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DriverError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl CapabilityDriver for RemoteDriver {
    async fn generate(&self, prompt: &str) -> Result<Artifact, DriverError> {
        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .timeout(self.timeout)
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await?;

        Ok(match Self::parse_response(response).await? {
            GenerateResponse::Finished { text } => Artifact::Finished(text),
            GenerateResponse::Evolving { handle } => Artifact::Evolving(handle),
        })
    }

    async fn sample(&self, handle: &ArtifactHandle) -> Result<String, DriverError> {
        let response = self
            .client
            .get(self.artifact_url(handle))
            .timeout(self.timeout)
            .send()
            .await?;
        let sample: SampleResponse = Self::parse_response(response).await?;
        Ok(sample.content)
    }

    async fn release(&self, handle: &ArtifactHandle) -> Result<(), DriverError> {
        let response = self
            .client
            .delete(self.artifact_url(handle))
            .timeout(self.timeout)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn publish(
        &self,
        target_url: &str,
        chapter: &ChapterSnapshot,
        settings: &PublishSettings,
    ) -> Result<PublishReceipt, DriverError> {
        let response = self
            .client
            .post(format!("{}/publish", self.base_url))
            .timeout(self.timeout)
            .json(&PublishRequest {
                target_url,
                chapter,
                settings,
            })
            .send()
            .await?;

        let result: PublishResponse = Self::parse_response(response).await?;
        if !result.success {
            return Err(DriverError::Rejected(
                result
                    .error
                    .unwrap_or_else(|| "publication target refused the chapter".to_string()),
            ));
        }

        Ok(PublishReceipt {
            external_id: result.external_id,
            url: result.url,
        })
    }
}

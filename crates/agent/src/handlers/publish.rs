use std::sync::LazyLock;

use inlands_core::job::PublishJob;
use inlands_core::log::Severity;
use inlands_core::protocol::{PublishOutcome, Submission};
use regex::Regex;

use super::JobContext;
use crate::client::QueueClientError;

/// Numeric path segments of a chapter URL.
static NUMERIC_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/(\d+)(?:[/?#]|$)").expect("valid regex"));

/// Pull the external chapter id out of the URL the target redirected to.
///
/// Uses the last numeric path segment, e.g. `.../book/12/chapter/7781` → `7781`.
pub fn external_id_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let mut last = None;
    let mut rest = path;
    while let Some(caps) = NUMERIC_SEGMENT.captures(rest) {
        let digits = caps.get(1)?;
        last = Some(digits.as_str().to_string());
        rest = &rest[digits.end()..];
    }
    last
}

/// Publish chapters one at a time, submitting each outcome as it lands.
///
/// Returns the first delivery failure once every chapter has been tried.
pub async fn run(ctx: &JobContext, job: &PublishJob) -> Result<(), QueueClientError> {
    tracing::info!(
        job_id = %job.job_id,
        project_id = %job.project_id,
        target_url = %job.target_url,
        chapters = job.chapters.len(),
        "Publish job started",
    );

    // Later chapters are still published when one outcome cannot be delivered.
    let mut undelivered: Option<QueueClientError> = None;
    for chapter in &job.chapters {
        ctx.report(
            &job.project_id,
            Severity::Info,
            format!("Publishing chapter {}: {}", chapter.number, chapter.title),
        )
        .await;

        let outcome = match ctx
            .driver
            .publish(&job.target_url, chapter, &job.settings)
            .await
        {
            Ok(receipt) => {
                let external_id = receipt
                    .external_id
                    .or_else(|| receipt.url.as_deref().and_then(external_id_from_url));
                if external_id.is_none() {
                    tracing::warn!(chapter_id = %chapter.id, "Published without an external id");
                }
                PublishOutcome::ok(&chapter.id, external_id)
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %job.job_id,
                    chapter_id = %chapter.id,
                    error = %e,
                    "Chapter publication failed",
                );
                ctx.report(
                    &job.project_id,
                    Severity::Error,
                    format!("Chapter {} was not published: {e}", chapter.number),
                )
                .await;
                PublishOutcome::failed(&chapter.id, e.to_string())
            }
        };

        let submission = Submission::Publish {
            project_id: job.project_id.clone(),
            job_id: Some(job.job_id),
            outcomes: vec![outcome],
        };
        if let Err(e) = ctx.deliver(&submission).await {
            tracing::error!(
                job_id = %job.job_id,
                chapter_id = %chapter.id,
                error = %e,
                "Publish outcome was not delivered",
            );
            undelivered.get_or_insert(e);
        }
    }

    tracing::info!(job_id = %job.job_id, "Publish job finished");
    match undelivered {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

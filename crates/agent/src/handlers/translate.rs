use inlands_core::job::{ChapterSource, TranslateJob};
use inlands_core::log::Severity;
use inlands_core::prompt::compose_translation_prompt;
use inlands_core::protocol::{Submission, TranslateOutcome};
use inlands_core::stability::StabilityDetector;

use super::JobContext;
use crate::client::QueueClientError;
use crate::driver::Artifact;
use crate::error::WorkerError;
use crate::watch::await_completion;

/// Translate every chapter of the batch in order, then submit once.
pub async fn run(ctx: &JobContext, job: &TranslateJob) -> Result<(), QueueClientError> {
    tracing::info!(
        job_id = %job.job_id,
        project_id = %job.project_id,
        chapters = job.chapters.len(),
        "Translate job started",
    );

    let mut outcomes = Vec::with_capacity(job.chapters.len());
    for chapter in &job.chapters {
        ctx.report(
            &job.project_id,
            Severity::Info,
            format!("Translating chapter {}: {}", chapter.number, chapter.title),
        )
        .await;

        match translate_chapter(ctx, job, chapter).await {
            Ok(text) => outcomes.push(TranslateOutcome::ok(&chapter.id, text)),
            Err(e) => {
                tracing::warn!(
                    job_id = %job.job_id,
                    chapter_id = %chapter.id,
                    error = %e,
                    "Chapter translation failed",
                );
                ctx.report(
                    &job.project_id,
                    Severity::Error,
                    format!("Chapter {} failed: {e}", chapter.number),
                )
                .await;
                outcomes.push(TranslateOutcome::failed(&chapter.id, e.to_string()));
            }
        }
    }

    let submission = Submission::Translate {
        project_id: job.project_id.clone(),
        job_id: Some(job.job_id),
        outcomes,
    };
    let report = ctx.deliver(&submission).await?;
    tracing::info!(job_id = %job.job_id, applied = report.applied, "Translate job submitted");
    Ok(())
}

async fn translate_chapter(
    ctx: &JobContext,
    job: &TranslateJob,
    chapter: &ChapterSource,
) -> Result<String, WorkerError> {
    let prompt = compose_translation_prompt(&job.prompt, &job.glossary, &chapter.original_text);

    let raw = match ctx.driver.generate(&prompt).await? {
        Artifact::Finished(text) => text,
        Artifact::Evolving(handle) => {
            let mut detector = StabilityDetector::new(ctx.stability.clone());
            let settled = await_completion(ctx.driver.as_ref(), &handle, &mut detector).await;
            if let Err(e) = ctx.driver.release(&handle).await {
                tracing::warn!(handle = %handle, error = %e, "Failed to release artifact");
            }
            settled?
        }
    };

    let text = ctx.stability.clean_output(&raw);
    if text.is_empty() {
        return Err(WorkerError::EmptyOutput);
    }
    Ok(text)
}

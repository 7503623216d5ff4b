use tracing::{error, info, warn};

use crate::modules::jobs::error::JobError;
use crate::modules::jobs::model::{ArtifactRef, JobOrigin, MediaJob};
use crate::modules::jobs::service::JobService;
use crate::state::AppState;

const UPLOADING_TEXT: &str = "Uploading the result...";
const DONE_TEXT: &str = "Done! Enjoy.";

/// Consumes the job queue one job at a time. Sequential on purpose: the
/// encode stage is CPU bound and the service runs as a single worker.
pub async fn start_transcoder_worker(state: AppState) {
    info!("Starting transcoder worker");

    while let Some(job_id) = state.queue.recv().await {
        let Some(job) = state.jobs.get(&job_id).await else {
            warn!(%job_id, "queued job no longer exists, skipping");
            continue;
        };

        info!(%job_id, operation = job.operation.as_str(), "picked up job");

        let result = JobService::execute(&state, job_id).await;

        match job.origin.clone() {
            JobOrigin::Chat {
                chat_id,
                status_message_id,
            } => match result {
                Ok(artifact) => {
                    if let Err(e) =
                        deliver(&state, &job, chat_id, status_message_id, &artifact).await
                    {
                        // the job stays succeeded: the artifact exists, only
                        // the upload failed, and terminal states never move
                        error!(%job_id, "delivery failed after retries: {}", e);
                        notify(&state, chat_id, status_message_id, &failure_text(
                            &JobError::Delivery("upload to chat failed".into()),
                        ))
                        .await;
                    }
                }
                Err(err) => {
                    notify(&state, chat_id, status_message_id, &failure_text(&err)).await;
                }
            },
            JobOrigin::Api => {
                if let Err(err) = result {
                    warn!(%job_id, "queued api job failed: {}", err);
                }
            }
        }
    }

    info!("Job queue closed, transcoder worker exiting");
}

async fn deliver(
    state: &AppState,
    job: &MediaJob,
    chat_id: i64,
    status_message_id: Option<i64>,
    artifact: &ArtifactRef,
) -> anyhow::Result<()> {
    if let Some(message_id) = status_message_id {
        // best effort, the upload matters more than the status line
        let _ = state
            .telegram
            .edit_message_text(chat_id, message_id, UPLOADING_TEXT)
            .await;
    }

    let path = JobService::artifact_path(&state.config, &artifact.file_name);
    state
        .telegram
        .send_media(
            chat_id,
            job.operation.telegram_method(),
            job.operation.telegram_field(),
            &path,
            &artifact.file_name,
            &artifact.content_type,
            artifact.size_bytes,
            None,
        )
        .await?;

    if let Some(message_id) = status_message_id {
        let _ = state
            .telegram
            .edit_message_text(chat_id, message_id, DONE_TEXT)
            .await;
    }

    info!(job_id = %job.id, chat_id, "artifact delivered to chat");
    Ok(())
}

async fn notify(state: &AppState, chat_id: i64, status_message_id: Option<i64>, text: &str) {
    let sent = match status_message_id {
        Some(message_id) => state.telegram.edit_message_text(chat_id, message_id, text).await,
        None => state.telegram.send_message(chat_id, text).await.map(|_| ()),
    };
    if let Err(e) = sent {
        error!(chat_id, "could not notify chat about job outcome: {}", e);
    }
}

/// User-facing text per failure kind. Diagnostics stay in the log.
fn failure_text(err: &JobError) -> String {
    match err {
        JobError::Validation(_) => {
            "Error: That doesn't look like a link I can process.".to_string()
        }
        JobError::Fetch(_) => {
            "Error: I couldn't fetch that link. Please check the URL and try again.".to_string()
        }
        JobError::Transcode(msg) if msg.contains("upload limit") => {
            "Error: The converted file is too large to send. Try a shorter clip.".to_string()
        }
        JobError::Transcode(_) => {
            "Error: I couldn't convert that file. It may be in an unsupported format.".to_string()
        }
        JobError::Timeout(_) => {
            "Error: Processing took too long and was cancelled. Try a shorter clip.".to_string()
        }
        JobError::Delivery(_) => {
            "Error: I couldn't upload the result. Please try again.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_text_never_leaks_diagnostics() {
        let err = JobError::Transcode("ffmpeg: moov atom not found at /tmp/x".into());
        let text = failure_text(&err);
        assert!(!text.contains("/tmp"));
        assert!(!text.contains("ffmpeg"));
    }

    #[test]
    fn oversized_output_gets_its_own_message() {
        let err = JobError::Transcode("output is 99 bytes, over the 50 byte upload limit".into());
        assert!(failure_text(&err).contains("too large"));
    }
}

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::TempDir;
use tokio::process::Command;
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

use super::error::JobError;
use super::model::{ArtifactRef, JobOrigin, MediaJob, Operation};
use crate::config::settings::AppConfig;
use crate::state::AppState;

pub struct JobService;

impl JobService {
    /// Validates the reference and registers a pending job. Nothing has
    /// been fetched or spawned yet; on validation failure no job exists.
    pub async fn submit(
        state: &AppState,
        source_url: &str,
        operation: Operation,
        origin: JobOrigin,
    ) -> Result<MediaJob, JobError> {
        let parsed = Url::parse(source_url)
            .map_err(|_| JobError::Validation("source_url is not a valid URL".into()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(JobError::Validation(
                "source_url must use http or https".into(),
            ));
        }

        let job = MediaJob::new(parsed.to_string(), operation, origin);
        state.jobs.insert(job.clone()).await;
        info!(job_id = %job.id, operation = operation.as_str(), "job accepted");
        Ok(job)
    }

    /// Runs a job to its terminal state and records the outcome in the
    /// store. The scoped workspace is released on every exit path.
    pub async fn execute(state: &AppState, id: Uuid) -> Result<ArtifactRef, JobError> {
        let job = state
            .jobs
            .get(&id)
            .await
            .ok_or_else(|| JobError::Validation(format!("unknown job {}", id)))?;

        state
            .jobs
            .mark_running(&id)
            .await
            .map_err(|e| JobError::Validation(e.to_string()))?;

        let result = Self::run_pipeline(state, &job).await;

        match &result {
            Ok(artifact) => {
                if let Err(e) = state.jobs.complete(&id, artifact.clone()).await {
                    warn!(job_id = %id, "failed to record success: {}", e);
                }
                info!(job_id = %id, bytes = artifact.size_bytes, "job succeeded");
            }
            Err(err) => {
                if let Err(e) = state.jobs.fail(&id, err).await {
                    warn!(job_id = %id, "failed to record failure: {}", e);
                }
                warn!(job_id = %id, kind = err.kind(), "job failed: {}", err);
            }
        }

        result
    }

    async fn run_pipeline(state: &AppState, job: &MediaJob) -> Result<ArtifactRef, JobError> {
        let config = &state.config;

        let workspace = TempDir::with_prefix_in(format!("job-{}-", job.id), &config.work_dir)
            .map_err(|e| JobError::Transcode(format!("workspace setup failed: {}", e)))?;

        let input = workspace.path().join("source.bin");
        state
            .fetcher
            .download(&job.source_url, &input)
            .await
            .map_err(|e| JobError::Fetch(e.to_string()))?;

        let output = workspace
            .path()
            .join(format!("output.{}", job.operation.output_extension()));

        let _permit = state
            .encoder_slots
            .acquire()
            .await
            .map_err(|_| JobError::Transcode("encoder unavailable".into()))?;

        let mut cmd = Command::new(&config.ffmpeg_path);
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(&input)
            .args(job.operation.codec_args())
            .arg("-y")
            .arg(&output);

        let out = run_command(&mut cmd, config.job_timeout_secs).await?;
        if !out.status.success() {
            return Err(JobError::Transcode(stderr_tail(&out.stderr)));
        }

        let meta = tokio::fs::metadata(&output)
            .await
            .map_err(|_| JobError::Transcode("encoder produced no output file".into()))?;
        let size = meta.len();
        if size == 0 {
            return Err(JobError::Transcode("encoder produced an empty file".into()));
        }
        if size > config.max_artifact_bytes {
            return Err(JobError::Transcode(format!(
                "output is {} bytes, over the {} byte upload limit; try a shorter clip",
                size, config.max_artifact_bytes
            )));
        }

        let file_name = format!("{}.{}", job.id, job.operation.output_extension());
        let dest = Self::artifact_path(config, &file_name);
        persist(&output, &dest)
            .await
            .map_err(|e| JobError::Transcode(format!("failed to store artifact: {}", e)))?;

        Ok(ArtifactRef {
            file_name,
            content_type: job.operation.content_type().to_string(),
            size_bytes: size,
        })
    }

    pub fn artifact_path(config: &AppConfig, file_name: &str) -> PathBuf {
        config.artifact_dir.join(file_name)
    }
}

/// Runs a subprocess with a hard deadline. `kill_on_drop` reaps the child
/// when the timed-out wait future is dropped, so a deadline always leaves
/// the process table clean.
pub(crate) async fn run_command(
    cmd: &mut Command,
    timeout_secs: u64,
) -> Result<std::process::Output, JobError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .map_err(|e| JobError::Transcode(format!("failed to launch encoder: {}", e)))?;

    match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(JobError::Transcode(format!("encoder wait failed: {}", e))),
        Err(_) => Err(JobError::Timeout(timeout_secs)),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "encoder exited with an error".to_string();
    }
    let tail: String = trimmed
        .chars()
        .rev()
        .take(400)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    tail
}

async fn persist(from: &Path, to: &Path) -> std::io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        // work dir and artifact dir may sit on different filesystems
        Err(_) => {
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn run_command_captures_success() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("exit 0");
        let out = run_command(&mut cmd, 5).await.unwrap();
        assert!(out.status.success());
    }

    #[tokio::test]
    async fn run_command_surfaces_stderr_on_failure() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo oops >&2; exit 1");
        let out = run_command(&mut cmd, 5).await.unwrap();
        assert!(!out.status.success());
        assert_eq!(stderr_tail(&out.stderr), "oops");
    }

    #[tokio::test]
    async fn run_command_kills_on_deadline() {
        let started = Instant::now();
        let mut cmd = Command::new("sleep");
        cmd.arg("30");

        let err = run_command(&mut cmd, 1).await.unwrap_err();
        assert!(matches!(err, JobError::Timeout(1)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn missing_binary_is_a_transcode_error() {
        let mut cmd = Command::new("/definitely/not/a/real/encoder");
        let err = run_command(&mut cmd, 1).await.unwrap_err();
        assert!(matches!(err, JobError::Transcode(_)));
    }

    #[test]
    fn stderr_tail_handles_empty_and_long_output() {
        assert_eq!(stderr_tail(b""), "encoder exited with an error");
        assert_eq!(stderr_tail(b"  \n"), "encoder exited with an error");

        let long = "x".repeat(1000);
        assert_eq!(stderr_tail(long.as_bytes()).len(), 400);
    }
}

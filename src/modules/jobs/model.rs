use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::JobError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Running => "RUNNING",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Status is monotonic: pending -> running -> {succeeded, failed}.
    pub fn can_transition(&self, next: JobStatus) -> bool {
        matches!(
            (*self, next),
            (JobStatus::Pending, JobStatus::Running)
                | (JobStatus::Pending, JobStatus::Failed)
                | (JobStatus::Running, JobStatus::Succeeded)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

/// The closed set of supported conversions. Each variant owns its ffmpeg
/// argument set, output container and content type, so an unsupported
/// operation cannot exist past deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Transcode,
    ExtractAudio,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Transcode => "transcode",
            Operation::ExtractAudio => "extract-audio",
        }
    }

    pub fn output_extension(&self) -> &'static str {
        match self {
            Operation::Transcode => "mp4",
            Operation::ExtractAudio => "mp3",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Operation::Transcode => "video/mp4",
            Operation::ExtractAudio => "audio/mpeg",
        }
    }

    /// Codec flags placed between `-i <input>` and the output path.
    pub fn codec_args(&self) -> &'static [&'static str] {
        match self {
            Operation::Transcode => &[
                "-c:v",
                "libx264",
                "-preset",
                "fast",
                "-c:a",
                "aac",
                "-movflags",
                "+faststart",
            ],
            Operation::ExtractAudio => &["-vn", "-acodec", "libmp3lame", "-b:a", "192k"],
        }
    }

    pub fn telegram_method(&self) -> &'static str {
        match self {
            Operation::Transcode => "sendVideo",
            Operation::ExtractAudio => "sendAudio",
        }
    }

    pub fn telegram_field(&self) -> &'static str {
        match self {
            Operation::Transcode => "video",
            Operation::ExtractAudio => "audio",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactRef {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct JobFailure {
    pub kind: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&JobError> for JobFailure {
    fn from(err: &JobError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// Where a job came from, and therefore where its result goes.
#[derive(Debug, Clone)]
pub enum JobOrigin {
    /// Submitted through the REST API; the caller polls or gets the result
    /// in the submission response.
    Api,
    /// Created from a chat callback; the artifact is uploaded back to the
    /// chat and the status message is edited along the way.
    Chat {
        chat_id: i64,
        status_message_id: Option<i64>,
    },
}

#[derive(Debug, Clone)]
pub struct MediaJob {
    pub id: Uuid,
    pub source_url: String,
    pub operation: Operation,
    pub status: JobStatus,
    pub origin: JobOrigin,
    pub error: Option<JobFailure>,
    pub artifact: Option<ArtifactRef>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl MediaJob {
    pub fn new(source_url: String, operation: Operation, origin: JobOrigin) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            source_url,
            operation,
            status: JobStatus::Pending,
            origin,
            error: None,
            artifact: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A link a chat user sent, parked until they pick a format from the
/// inline keyboard.
#[derive(Debug, Clone)]
pub struct PendingLink {
    pub url: String,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_are_monotonic() {
        assert!(JobStatus::Pending.can_transition(JobStatus::Running));
        assert!(JobStatus::Pending.can_transition(JobStatus::Failed));
        assert!(JobStatus::Running.can_transition(JobStatus::Succeeded));
        assert!(JobStatus::Running.can_transition(JobStatus::Failed));

        assert!(!JobStatus::Running.can_transition(JobStatus::Pending));
        assert!(!JobStatus::Succeeded.can_transition(JobStatus::Failed));
        assert!(!JobStatus::Succeeded.can_transition(JobStatus::Running));
        assert!(!JobStatus::Failed.can_transition(JobStatus::Succeeded));
        assert!(!JobStatus::Pending.can_transition(JobStatus::Succeeded));
    }

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn operation_wire_names() {
        assert_eq!(
            serde_json::to_string(&Operation::ExtractAudio).unwrap(),
            "\"extract-audio\""
        );
        assert_eq!(
            serde_json::from_str::<Operation>("\"transcode\"").unwrap(),
            Operation::Transcode
        );
        assert!(serde_json::from_str::<Operation>("\"resize\"").is_err());
    }

    #[test]
    fn operation_output_contracts() {
        assert_eq!(Operation::ExtractAudio.output_extension(), "mp3");
        assert_eq!(Operation::ExtractAudio.content_type(), "audio/mpeg");
        assert_eq!(Operation::ExtractAudio.telegram_method(), "sendAudio");
        assert!(Operation::ExtractAudio.codec_args().contains(&"libmp3lame"));

        assert_eq!(Operation::Transcode.output_extension(), "mp4");
        assert_eq!(Operation::Transcode.content_type(), "video/mp4");
        assert_eq!(Operation::Transcode.telegram_method(), "sendVideo");
        assert!(Operation::Transcode.codec_args().contains(&"libx264"));
    }

    #[test]
    fn new_job_starts_pending_without_result() {
        let job = MediaJob::new(
            "https://example.com/clip.mp4".into(),
            Operation::Transcode,
            JobOrigin::Api,
        );
        assert_eq!(job.status, JobStatus::Pending);
        assert!(job.error.is_none());
        assert!(job.artifact.is_none());
    }
}

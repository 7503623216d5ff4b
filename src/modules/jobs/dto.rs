use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use super::model::{ArtifactRef, JobFailure, MediaJob, Operation};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateJobRequest {
    pub source_url: String,
    pub operation: Operation,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobResponse {
    pub id: Uuid,
    pub status: String,
    pub operation: Operation,
    pub source_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailureDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactDto>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobFailureDto {
    pub kind: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&JobFailure> for JobFailureDto {
    fn from(failure: &JobFailure) -> Self {
        Self {
            kind: failure.kind.clone(),
            message: failure.message.clone(),
            retryable: failure.retryable,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArtifactDto {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    /// Relative download location for the artifact.
    pub href: String,
}

impl ArtifactDto {
    fn new(job_id: Uuid, artifact: &ArtifactRef) -> Self {
        Self {
            file_name: artifact.file_name.clone(),
            content_type: artifact.content_type.clone(),
            size_bytes: artifact.size_bytes,
            href: format!("/api/v1/jobs/{}/artifact", job_id),
        }
    }
}

impl From<&MediaJob> for JobResponse {
    fn from(job: &MediaJob) -> Self {
        Self {
            id: job.id,
            status: job.status.as_str().to_string(),
            operation: job.operation,
            source_url: job.source_url.clone(),
            error: job.error.as_ref().map(JobFailureDto::from),
            artifact: job.artifact.as_ref().map(|a| ArtifactDto::new(job.id, a)),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::jobs::model::{JobOrigin, JobStatus};

    #[test]
    fn response_reflects_terminal_success() {
        let mut job = MediaJob::new(
            "https://example.com/a.mp4".into(),
            Operation::ExtractAudio,
            JobOrigin::Api,
        );
        job.status = JobStatus::Succeeded;
        job.artifact = Some(ArtifactRef {
            file_name: format!("{}.mp3", job.id),
            content_type: "audio/mpeg".into(),
            size_bytes: 42,
        });

        let dto = JobResponse::from(&job);
        assert_eq!(dto.status, "SUCCEEDED");
        let artifact = dto.artifact.as_ref().unwrap();
        assert_eq!(artifact.href, format!("/api/v1/jobs/{}/artifact", job.id));
        assert!(dto.error.is_none());

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["operation"], "extract-audio");
        // rfc3339 timestamps on the wire
        assert!(json["created_at"].as_str().unwrap().contains('T'));
    }
}

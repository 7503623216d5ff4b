use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::modules::jobs::dto::{CreateJobRequest, JobResponse};
use crate::modules::jobs::model::JobOrigin;
use crate::modules::jobs::service::JobService;
use crate::state::AppState;

/// Submit a job and run it to completion within the request.
#[utoipa::path(
    post,
    path = "/api/v1/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 200, description = "Job completed", body = ApiResponse<JobResponse>),
        (status = 400, description = "Invalid request"),
        (status = 422, description = "Source could not be transcoded"),
        (status = 502, description = "Source could not be fetched"),
        (status = 504, description = "Processing deadline exceeded")
    ),
    tag = "Jobs"
)]
pub async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Response {
    let job = match JobService::submit(&state, &req.source_url, req.operation, JobOrigin::Api).await
    {
        Ok(job) => job,
        Err(e) => return e.into_response(),
    };

    match JobService::execute(&state, job.id).await {
        Ok(_) => match state.jobs.get(&job.id).await {
            Some(done) => ApiSuccess(
                ApiResponse::success(JobResponse::from(&done), "Job completed"),
                StatusCode::OK,
            )
            .into_response(),
            None => ApiError(
                "Job was reclaimed before the response".to_string(),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .into_response(),
        },
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job status", body = ApiResponse<JobResponse>),
        (status = 404, description = "Job not found")
    ),
    tag = "Jobs"
)]
pub async fn get_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.jobs.get(&id).await {
        Some(job) => ApiSuccess(
            ApiResponse::success(JobResponse::from(&job), "Job retrieved"),
            StatusCode::OK,
        )
        .into_response(),
        None => ApiError("Job not found".to_string(), StatusCode::NOT_FOUND).into_response(),
    }
}

/// Download a finished artifact. Gone once the retention window passes.
#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}/artifact",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Artifact file", body = Vec<u8>),
        (status = 404, description = "No artifact for this job")
    ),
    tag = "Jobs"
)]
pub async fn get_artifact(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let Some(job) = state.jobs.get(&id).await else {
        return ApiError("Job not found".to_string(), StatusCode::NOT_FOUND).into_response();
    };

    let Some(artifact) = job.artifact else {
        return ApiError(
            "Job has no artifact".to_string(),
            StatusCode::NOT_FOUND,
        )
        .into_response();
    };

    let path = JobService::artifact_path(&state.config, &artifact.file_name);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(_) => {
            return ApiError("Artifact has expired".to_string(), StatusCode::NOT_FOUND)
                .into_response();
        }
    };

    let body = Body::from_stream(ReaderStream::new(file));
    (
        [
            (header::CONTENT_TYPE, artifact.content_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.file_name),
            ),
        ],
        body,
    )
        .into_response()
}

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::jobs::handler::create_job,
        crate::modules::jobs::handler::get_job,
        crate::modules::jobs::handler::get_artifact,
        crate::modules::webhook::handler::register_webhook,
    ),
    components(
        schemas(
            crate::modules::jobs::dto::CreateJobRequest,
            crate::modules::jobs::dto::JobResponse,
            crate::modules::jobs::dto::JobFailureDto,
            crate::modules::jobs::dto::ArtifactDto,
            crate::modules::jobs::model::Operation,
        )
    ),
    tags(
        (name = "Jobs", description = "Media conversion jobs"),
        (name = "Telegram", description = "Webhook management")
    )
)]
pub struct ApiDoc;

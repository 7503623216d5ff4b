use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::state::AppState;

/// Inbound bodies are small JSON documents (webhook updates, job
/// submissions); media enters the system by URL, never by upload.
const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn configure_routes(state: AppState) -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", axum::routing::get(index))
        .nest("/api/v1", api_routes())
        .nest("/api/v1/jobs", crate::modules::jobs::router())
        .nest("/telegram", crate::modules::webhook::router(state))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
}

async fn index() -> &'static str {
    "mediabot is running"
}

fn api_routes() -> Router<AppState> {
    Router::new().route("/health", axum::routing::get(|| async { "ok" }))
}

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::modules::webhook::dto::Update;
use crate::modules::webhook::service::WebhookService;
use crate::state::AppState;

/// Receives one update from the platform. The update is acknowledged
/// immediately and processed on a background task; a slow conversion must
/// never stall the webhook, or the platform re-delivers the update.
pub async fn receive_update(State(state): State<AppState>, Json(update): Json<Update>) -> Response {
    debug!(update_id = update.update_id, "received webhook update");
    tokio::spawn(WebhookService::handle_update(state, update));
    (StatusCode::OK, "ok").into_response()
}

/// Registers this service's webhook endpoint with the platform.
#[utoipa::path(
    post,
    path = "/telegram/set-webhook",
    responses(
        (status = 200, description = "Webhook registered", body = ApiResponse<String>),
        (status = 400, description = "No public URL configured"),
        (status = 502, description = "Platform rejected the registration")
    ),
    tag = "Telegram"
)]
pub async fn register_webhook(State(state): State<AppState>) -> Response {
    let Some(public_url) = state.config.public_url.clone() else {
        return ApiError(
            "PUBLIC_URL is not configured".to_string(),
            StatusCode::BAD_REQUEST,
        )
        .into_response();
    };

    let webhook_url = format!("{}/telegram/webhook", public_url.trim_end_matches('/'));

    match state
        .telegram
        .set_webhook(&webhook_url, &state.config.webhook_secret)
        .await
    {
        Ok(()) => ApiSuccess(
            ApiResponse::success(webhook_url, "Webhook registered"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError(
            format!("Failed to register webhook: {}", e),
            StatusCode::BAD_GATEWAY,
        )
        .into_response(),
    }
}

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::common::response::ApiError;
use crate::state::AppState;

/// Header the platform echoes back on every webhook delivery when a
/// secret token was supplied at registration time.
const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

pub async fn webhook_guard(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = req
        .headers()
        .get(SECRET_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(token) if token == state.config.webhook_secret => Ok(next.run(req).await),
        _ => Err(ApiError(
            "Unauthorized: missing or invalid webhook secret".to_string(),
            StatusCode::UNAUTHORIZED,
        )),
    }
}

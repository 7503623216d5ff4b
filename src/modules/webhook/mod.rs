use axum::Router;
use axum::middleware;
use axum::routing::post;

use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod service;

pub fn router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new().route("/set-webhook", post(handler::register_webhook));

    let guarded_routes = Router::new()
        .route("/webhook", post(handler::receive_update))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::webhook_guard,
        ));

    public_routes.merge(guarded_routes)
}

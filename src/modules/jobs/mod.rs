use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

pub mod dto;
pub mod error;
pub mod handler;
pub mod model;
pub mod service;
pub mod store;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::create_job))
        .route("/{id}", get(handler::get_job))
        .route("/{id}/artifact", get(handler::get_artifact))
}

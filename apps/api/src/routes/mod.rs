pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::retrieval::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/retrieval", post(handlers::handle_retrieve))
        .route(
            "/api/v1/retrieval/sections",
            post(handlers::handle_sections),
        )
        .with_state(state)
}

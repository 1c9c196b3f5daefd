pub mod body;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::handle_index))
        .route("/health", get(health::health_handler))
        .route("/process", post(handlers::handle_process))
        .route("/submit", post(handlers::handle_submit))
        .route("/ats", post(handlers::handle_ats))
        .route(
            "/generate_resume_html",
            post(handlers::handle_generate_resume_html),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/subjects/:id/matches",
            get(handlers::handle_subject_matches),
        )
        .route("/api/v1/matches/run", post(handlers::handle_run_all))
        .with_state(state)
}

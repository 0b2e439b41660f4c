pub mod health;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::candidates::handlers;
use crate::errors::AppError;
use crate::state::AppState;

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/candidates",
            get(handlers::handle_list_candidates).post(handlers::handle_create_candidate),
        )
        .route(
            "/api/candidates/stats",
            get(handlers::handle_candidate_stats),
        )
        .route(
            "/api/candidates/:id",
            get(handlers::handle_get_candidate)
                .put(handlers::handle_update_candidate)
                .delete(handlers::handle_delete_candidate),
        )
        .route(
            "/api/candidates/:id/status",
            patch(handlers::handle_set_status),
        )
        .fallback(route_not_found)
        .with_state(state)
}

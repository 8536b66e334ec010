pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::notifications::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/notifications",
            get(handlers::handle_list)
                .post(handlers::handle_create)
                .delete(handlers::handle_clear),
        )
        .route("/api/v1/notifications/:id", delete(handlers::handle_remove))
        .route(
            "/api/v1/notifications/:id/hover",
            post(handlers::handle_hover_start).delete(handlers::handle_hover_end),
        )
        .route(
            "/api/v1/notifications/:id/action",
            post(handlers::handle_invoke_action),
        )
        .with_state(state)
}

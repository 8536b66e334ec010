use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, and the active notification session.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "notify-api",
        "session_id": state.notifications.session_id(),
        "active_notifications": state.notifications.len(),
        "max_active_notifications": state.config.notification_max_active
    }))
}

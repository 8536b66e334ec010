use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::notifications::models::{
    NotificationAction, NotificationId, NotificationRequest, NotificationSpec,
};
use crate::notifications::presenter::NotificationView;
use crate::notifications::NotificationError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: NotificationId,
}

/// GET /api/v1/notifications
pub async fn handle_list(State(state): State<AppState>) -> Json<Vec<NotificationView>> {
    Json(state.notifications.views())
}

/// POST /api/v1/notifications
/// Any body that cannot become a spec is reported as `INVALID_SPEC`.
pub async fn handle_create(
    State(state): State<AppState>,
    payload: Result<Json<NotificationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let Json(mut req) =
        payload.map_err(|e| NotificationError::InvalidSpec(e.body_text()))?;
    let action_label = req.action_label.take();
    let mut spec = NotificationSpec::try_from(req)?;
    if let Some(label) = action_label {
        // Clicks on REST-created actions are observed via NotificationCenter::actions().
        spec = spec.action(NotificationAction::new(label, || {}));
    }
    let id = state.notifications.add_notification(spec)?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// DELETE /api/v1/notifications
pub async fn handle_clear(State(state): State<AppState>) -> StatusCode {
    state.notifications.clear_all_notifications();
    StatusCode::NO_CONTENT
}

/// DELETE /api/v1/notifications/:id
/// Idempotent: unknown ids still return 204.
pub async fn handle_remove(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = notification_id(path)?;
    state.notifications.remove_notification(id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/:id/hover
pub async fn handle_hover_start(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = notification_id(path)?;
    if state.notifications.hover_start(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// DELETE /api/v1/notifications/:id/hover
pub async fn handle_hover_end(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = notification_id(path)?;
    if state.notifications.hover_end(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// POST /api/v1/notifications/:id/action
pub async fn handle_invoke_action(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = notification_id(path)?;
    if state.notifications.invoke_action(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "Notification {id} not found or has no action"
        )))
    }
}

fn notification_id(path: Result<Path<u64>, PathRejection>) -> Result<NotificationId, AppError> {
    let Path(id) = path.map_err(|e| AppError::Validation(e.body_text()))?;
    Ok(NotificationId(id))
}

fn not_found(id: NotificationId) -> AppError {
    AppError::NotFound(format!("Notification {id} not found"))
}

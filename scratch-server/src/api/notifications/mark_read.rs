use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use scratch_sdk::objects::AckResponse;
use uuid::Uuid;

use super::NotificationsApiError;
use crate::api::extractors::AuthenticatedUser;
use crate::state::AppState;

/// `PUT /notifications/{notification_id}/read`: idempotent.
///
/// Another user's notification is reported as 404.
pub(super) async fn mark_read(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, NotificationsApiError> {
    let notification = state
        .engine
        .ledger
        .mark_read(&identity.user_id, notification_id)
        .await?;
    Ok(Json(notification))
}

/// `PUT /notifications/mark-all-read`
pub(super) async fn mark_all_read(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl IntoResponse, NotificationsApiError> {
    let updated = state.engine.ledger.mark_all_read(&identity.user_id).await?;
    tracing::debug!(user_id = %identity.user_id, updated, "Marked notifications read");
    Ok(Json(AckResponse {
        message: "All notifications marked as read".to_owned(),
    }))
}

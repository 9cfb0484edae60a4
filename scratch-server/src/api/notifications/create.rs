use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use scratch_core::entities::notification::NewNotification;
use scratch_sdk::objects::CreateNotificationRequest;

use super::NotificationsApiError;
use crate::api::extractors::AuthenticatedUser;
use crate::state::AppState;

/// `POST /notifications`: append a notification to the caller's ledger.
///
/// The new notification is also pushed to the caller's open sockets.
pub(super) async fn create_notification(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<impl IntoResponse, NotificationsApiError> {
    if request.message.trim().is_empty() {
        return Err(NotificationsApiError::EmptyMessage);
    }

    let notification = state
        .engine
        .ledger
        .append(NewNotification {
            owner: identity.user_id,
            kind: request.kind.into(),
            message: request.message,
            metadata: request.metadata,
            dedup_key: None,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(notification)))
}

use axum::{Json, extract::State, response::IntoResponse};

use super::NotificationsApiError;
use crate::api::extractors::AuthenticatedUser;
use crate::state::AppState;

/// `GET /notifications`: the caller's notifications, newest first.
pub(super) async fn list_notifications(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl IntoResponse, NotificationsApiError> {
    let notifications = state.engine.ledger.list(&identity.user_id).await?;
    Ok(Json(notifications))
}

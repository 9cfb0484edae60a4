use axum::{Json, extract::State, response::IntoResponse};
use scratch_sdk::objects::UnreadCountResponse;

use super::NotificationsApiError;
use crate::api::extractors::AuthenticatedUser;
use crate::state::AppState;

/// `GET /notifications/unread-count`
pub(super) async fn unread_count(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl IntoResponse, NotificationsApiError> {
    let unread = state.engine.ledger.unread_count(&identity.user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

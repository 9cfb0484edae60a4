use axum::{Json, extract::State, response::IntoResponse};

use super::CardsApiError;
use crate::api::extractors::AuthenticatedUser;
use crate::state::AppState;

/// `GET /cards/available`: list active cards, shuffled.
///
/// Each card shows whether the caller's side is already taken (`isScratched`)
/// and whether the opposite side is (`isLocked`). Codes are hidden until the
/// caller's own claim allows them.
pub(super) async fn available_cards(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl IntoResponse, CardsApiError> {
    let cards = state.engine.claims.available_cards(&identity).await?;
    Ok(Json(cards))
}

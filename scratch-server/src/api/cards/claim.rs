use axum::{Json, extract::State, response::IntoResponse};
use scratch_core::engine::ClaimOutcome;
use scratch_sdk::objects::{ClaimCardRequest, ClaimCardResponse};

use super::CardsApiError;
use crate::api::extractors::AuthenticatedUser;
use crate::state::AppState;

/// `POST /cards/claim`: claim the caller's bucket slot on a card.
///
/// Re-claiming a slot the caller already holds succeeds with
/// `alreadyClaimed: true`. A slot held by someone else is a 409.
pub(super) async fn claim_card(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<ClaimCardRequest>,
) -> Result<impl IntoResponse, CardsApiError> {
    let outcome = state.engine.claims.claim(request.card_id, &identity).await?;
    Ok(Json(to_response(outcome)))
}

fn to_response(outcome: ClaimOutcome) -> ClaimCardResponse {
    let already_claimed = outcome.already_claimed();
    ClaimCardResponse {
        code: outcome.code,
        matched: outcome.matched,
        matched_user: outcome.matched_user,
        already_claimed,
    }
}

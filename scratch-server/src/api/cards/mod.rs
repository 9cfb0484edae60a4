//! Card API handlers.
//!
//! # Endpoints
//!
//! - `GET  /available` – active cards from the caller's perspective
//! - `POST /claim`     – claim the caller's side of a card

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use scratch_core::engine::ClaimError;

use crate::state::AppState;

mod available;
mod claim;

/// Build the Card API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/available", get(available::available_cards))
        .route("/claim", post(claim::claim_card))
}

/// Errors that can occur in Card API handlers.
#[derive(Debug)]
enum CardsApiError {
    Claim(ClaimError),
}

impl From<ClaimError> for CardsApiError {
    fn from(value: ClaimError) -> Self {
        Self::Claim(value)
    }
}

impl IntoResponse for CardsApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            CardsApiError::Claim(ClaimError::NotFound) => {
                (StatusCode::NOT_FOUND, "card not found").into_response()
            }
            CardsApiError::Claim(ClaimError::Conflict) => (
                StatusCode::CONFLICT,
                "card already claimed by another user",
            )
                .into_response(),
            CardsApiError::Claim(ClaimError::Store(e)) => {
                tracing::error!(error = %e, "Card API storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

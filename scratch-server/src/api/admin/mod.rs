//! Admin API handlers.
//!
//! These endpoints are called by operators and require the
//! `Scratch-Admin-Authorization` header with the plaintext admin secret.
//!
//! # Endpoints
//!
//! - `GET  /pool`            – active pool and its counters
//! - `POST /pool/initialize` – create a pool of `count` codes
//! - `POST /pool/deactivate` – retire the active pool

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use scratch_core::engine::PoolError;

use crate::state::AppState;

mod deactivate_pool;
mod initialize_pool;
mod pool_status;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pool", get(pool_status::pool_status))
        .route("/pool/initialize", post(initialize_pool::initialize_pool))
        .route("/pool/deactivate", post(deactivate_pool::deactivate_pool))
}

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
pub(crate) enum AdminApiError {
    Pool(PoolError),
    NoActivePool,
}

impl From<PoolError> for AdminApiError {
    fn from(value: PoolError) -> Self {
        Self::Pool(value)
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminApiError::Pool(e @ PoolError::InvalidPoolSize { .. }) => {
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            AdminApiError::Pool(PoolError::PoolAlreadyActive) => {
                (StatusCode::CONFLICT, "a pool is already active").into_response()
            }
            AdminApiError::Pool(PoolError::Store(e)) => {
                tracing::error!(error = %e, "Admin API storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            AdminApiError::NoActivePool => {
                (StatusCode::NOT_FOUND, "no active pool").into_response()
            }
        }
    }
}

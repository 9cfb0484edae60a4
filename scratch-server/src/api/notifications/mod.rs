//! Notification API handlers.
//!
//! Every route acts on the caller's own ledger; the owner always comes from
//! the verified identity, never from the request.
//!
//! # Endpoints
//!
//! - `GET  /`              – list, newest first
//! - `POST /`              – append a notification for the caller
//! - `GET  /unread-count`  – unread badge count
//! - `PUT  /mark-all-read` – mark every notification read
//! - `PUT  /{id}/read`     – mark one notification read

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use scratch_core::engine::LedgerError;

use crate::state::AppState;

mod create;
mod list;
mod mark_read;
mod unread_count;

/// Build the Notification API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list::list_notifications).post(create::create_notification),
        )
        .route("/unread-count", get(unread_count::unread_count))
        .route("/mark-all-read", put(mark_read::mark_all_read))
        .route("/{notification_id}/read", put(mark_read::mark_read))
}

/// Errors that can occur in Notification API handlers.
#[derive(Debug)]
enum NotificationsApiError {
    Ledger(LedgerError),
    EmptyMessage,
}

impl From<LedgerError> for NotificationsApiError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

impl IntoResponse for NotificationsApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            NotificationsApiError::Ledger(LedgerError::NotFound) => {
                (StatusCode::NOT_FOUND, "notification not found").into_response()
            }
            NotificationsApiError::Ledger(LedgerError::Store(e)) => {
                tracing::error!(error = %e, "Notification API storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            NotificationsApiError::EmptyMessage => {
                (StatusCode::BAD_REQUEST, "message must not be empty").into_response()
            }
        }
    }
}

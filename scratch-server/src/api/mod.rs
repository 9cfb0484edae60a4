//! HTTP API, mounted under `/api/v1`.
//!
//! - `/cards/*`         – card listing and claiming (signed identity)
//! - `/notifications/*` – notification ledger (signed identity)
//! - `/admin/*`         – pool management (admin secret)
//! - `/ws`              – realtime stream (signed identity, header or query)

use axum::{Router, routing::get};

use crate::state::AppState;

pub mod admin;
pub mod cards;
pub mod extractors;
pub mod notifications;
mod ws;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/cards", cards::router())
        .nest("/notifications", notifications::router())
        .nest("/admin", admin::router())
        .route("/ws", get(ws::realtime_ws))
}

use axum::{Json, extract::State, response::IntoResponse};
use scratch_core::engine::PoolStatus;
use scratch_sdk::objects::PoolStatusResponse;

use super::AdminApiError;
use crate::api::extractors::AdminAuth;
use crate::state::AppState;

/// `GET /admin/pool`: the active pool with claim counters.
pub async fn pool_status(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<impl IntoResponse, AdminApiError> {
    let PoolStatus { pool, stats } = state
        .engine
        .pools
        .status()
        .await?
        .ok_or(AdminApiError::NoActivePool)?;

    Ok(Json(PoolStatusResponse {
        pool: pool.into(),
        claimed_slots: stats.claimed_slots,
        matched_cards: stats.matched_cards,
    }))
}

use axum::{Json, extract::State, response::IntoResponse};
use scratch_sdk::objects::PoolEpochResponse;

use super::AdminApiError;
use crate::api::extractors::AdminAuth;
use crate::state::AppState;

/// `POST /admin/pool/deactivate`: retire the active pool.
///
/// Responds with the retired pool, or `null` when none was active.
pub async fn deactivate_pool(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<impl IntoResponse, AdminApiError> {
    let pool = state.engine.pools.deactivate().await?;
    Ok(Json(pool.map(PoolEpochResponse::from)))
}

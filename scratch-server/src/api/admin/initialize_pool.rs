use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use scratch_sdk::objects::{InitializePoolRequest, PoolEpochResponse};

use super::AdminApiError;
use crate::api::extractors::AdminAuth;
use crate::state::AppState;

/// `POST /admin/pool/initialize`: create a pool of `count` codes, each
/// printed on one card per bucket.
///
/// Fails with 409 while another pool is active.
pub async fn initialize_pool(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Json(request): Json<InitializePoolRequest>,
) -> Result<impl IntoResponse, AdminApiError> {
    let pool = state.engine.pools.initialize(request.count).await?;
    Ok((StatusCode::CREATED, Json(PoolEpochResponse::from(pool))))
}

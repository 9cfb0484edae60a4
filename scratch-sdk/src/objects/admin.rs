//! Admin API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /admin/pool/initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializePoolRequest {
    /// Number of distinct codes; the pool gets two cards per code.
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolEpochResponse {
    pub id: Uuid,
    pub active: bool,
    pub card_count: i32,
    pub created_at: i64,
    pub deactivated_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStatusResponse {
    pub pool: PoolEpochResponse,
    /// Number of filled claim slots across the pool (two per card at most).
    pub claimed_slots: i64,
    pub matched_cards: i64,
}

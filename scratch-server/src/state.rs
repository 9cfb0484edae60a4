//! Application state shared across all request handlers.

use crate::config::runtime::SharedConfig;
use scratch_core::engine::ScratchEngine;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
    /// Claim engine, notification ledger, pool initializer and fanout.
    pub engine: ScratchEngine,
}

impl AppState {
    pub fn new(config: SharedConfig, engine: ScratchEngine) -> Self {
        Self { config, engine }
    }
}

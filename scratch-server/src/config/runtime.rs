//! Runtime configuration: validated values shared with request handlers.
//!
//! Admin and identity settings live in `scratch-sdk::config`, claim policy in
//! `scratch-core::config`. Each reloadable section gets its own lock so a
//! SIGHUP swaps them independently.

pub use scratch_core::config::{CardsConfig, ConfigStore};
pub use scratch_sdk::config::{AdminConfig, IdentityConfig};

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// Configuration sections behind shared handles.
#[derive(Clone)]
pub struct SharedConfig {
    pub server: Arc<RwLock<ServerConfig>>,
    pub admin: Arc<RwLock<AdminConfig>>,
    pub identity: Arc<RwLock<IdentityConfig>>,
    /// Also held by the claim engine and pool initializer.
    pub cards: ConfigStore<CardsConfig>,
}

impl SharedConfig {
    pub fn new(
        server: ServerConfig,
        admin: AdminConfig,
        identity: IdentityConfig,
        cards: CardsConfig,
    ) -> Self {
        Self {
            server: Arc::new(RwLock::new(server)),
            admin: Arc::new(RwLock::new(admin)),
            identity: Arc::new(RwLock::new(identity)),
            cards: ConfigStore::new(cards),
        }
    }
}

//! TOML file configuration structures.
//!
//! These structs directly map to the `scratch-config.toml` file format.

use scratch_core::config::CardsConfig as CoreCardsConfig;
use scratch_sdk::objects::Profile;
use scratch_sdk::signature::DEFAULT_MAX_ASSERTION_AGE;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub identity: IdentityConfig,
    #[serde(default)]
    pub cards: CardsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Admin configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// The admin secret. If this is plaintext (doesn't start with `$argon2`),
    /// it will be hashed and the config file will be rewritten.
    pub secret: String,
}

/// Trust settings for the identity provider's signed assertions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// HMAC key shared with the identity provider.
    pub secret: String,
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: i64,
}

fn default_max_age_secs() -> i64 {
    DEFAULT_MAX_ASSERTION_AGE
}

/// Card pool and claim policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardsConfig {
    #[serde(default = "default_true")]
    pub reveal_code_on_claim: bool,
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            reveal_code_on_claim: true,
            code_length: default_code_length(),
            max_pool_size: default_max_pool_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_code_length() -> usize {
    CoreCardsConfig::DEFAULT_CODE_LENGTH
}

fn default_max_pool_size() -> u32 {
    CoreCardsConfig::DEFAULT_MAX_POOL_SIZE
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// sqlx Postgres pool; `DATABASE_URL` must be set.
    #[default]
    Postgres,
    /// Process memory. State is lost on restart.
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Where match profiles come from: a profile service, or inline entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<Profile>,
}

impl FileConfig {
    /// Check if the admin secret is already hashed (argon2 format).
    pub fn is_admin_secret_hashed(&self) -> bool {
        scratch_sdk::config::is_hashed(&self.admin.secret)
    }
}

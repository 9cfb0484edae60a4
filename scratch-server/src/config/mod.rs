//! Configuration module for scratch-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;
pub mod runtime;

use crate::config::file::{FileConfig, StorageBackend};
use crate::config::runtime::{AdminConfig, CardsConfig, IdentityConfig, ServerConfig, SharedConfig};
use scratch_sdk::objects::Profile;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Longest accepted card code.
const MAX_CODE_LENGTH: usize = 32;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Where the match resolver looks up profiles.
#[derive(Debug, Clone)]
pub enum ProfileSource {
    Http(Url),
    Static(Vec<Profile>),
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub identity: IdentityConfig,
    pub cards: CardsConfig,
    pub storage: StorageBackend,
    pub profiles: ProfileSource,
}

impl LoadedConfig {
    /// Convert the reloadable sections into a [`SharedConfig`].
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig::new(self.server, self.admin, self.identity, self.cards)
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;

        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = scratch_sdk::config::hash_secret(&file_config.admin.secret)
                .map_err(|e| ConfigError::HashError(e.to_string()))?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        Ok(build_loaded_config(file_config, secret_hash))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.identity.secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "identity.secret must not be empty".to_owned(),
        ));
    }
    if config.identity.max_age_secs <= 0 {
        return Err(ConfigError::ValidationError(
            "identity.max_age_secs must be positive".to_owned(),
        ));
    }
    if !(1..=MAX_CODE_LENGTH).contains(&config.cards.code_length) {
        return Err(ConfigError::ValidationError(format!(
            "cards.code_length must be between 1 and {MAX_CODE_LENGTH}"
        )));
    }
    if config.cards.max_pool_size == 0 {
        return Err(ConfigError::ValidationError(
            "cards.max_pool_size must be at least 1".to_owned(),
        ));
    }
    if config.profiles.base_url.is_some() && !config.profiles.entries.is_empty() {
        tracing::warn!("profiles.base_url is set; inline profile entries are ignored");
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig, secret_hash: String) -> LoadedConfig {
    let FileConfig {
        server,
        identity,
        cards,
        storage,
        profiles,
        ..
    } = file_config;

    let profiles = match profiles.base_url {
        Some(base_url) => ProfileSource::Http(base_url),
        None => ProfileSource::Static(profiles.entries),
    };

    LoadedConfig {
        server: ServerConfig {
            listen: server.listen,
        },
        admin: AdminConfig::new(secret_hash),
        identity: IdentityConfig::new(identity.secret.into_bytes(), identity.max_age_secs),
        cards: CardsConfig {
            reveal_code_on_claim: cards.reveal_code_on_claim,
            code_length: cards.code_length,
            max_pool_size: cards.max_pool_size,
        },
        storage: storage.backend,
        profiles,
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "scratch-config-{name}-{}",
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scratch-config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    const PLAINTEXT: &str = r#"
[admin]
secret = "hunter2"

[identity]
secret = "idp-shared-key"

[storage]
backend = "memory"
"#;

    #[test]
    fn load_hashes_plaintext_secret_and_rewrites_file() {
        let path = write_config("hash", PLAINTEXT);
        let loader = ConfigLoader::new(&path, None);

        let loaded = loader.load().unwrap();
        assert!(loaded.admin.verify_secret("hunter2"));
        assert_eq!(loaded.storage, StorageBackend::Memory);
        assert!(matches!(loaded.profiles, ProfileSource::Static(ref p) if p.is_empty()));

        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("$argon2"));
        assert!(!rewritten.contains("hunter2"));

        // A second load keeps the existing hash.
        let reloaded = loader.reload().unwrap();
        assert_eq!(reloaded.admin.secret_hash, loaded.admin.secret_hash);
    }

    #[test]
    fn listen_override_wins() {
        let path = write_config("listen", PLAINTEXT);
        let listen: SocketAddr = "127.0.0.1:4321".parse().unwrap();
        let loaded = ConfigLoader::new(&path, Some(listen)).load().unwrap();
        assert_eq!(loaded.server.listen, listen);
    }

    #[test]
    fn rejects_empty_identity_secret() {
        let path = write_config(
            "empty-identity",
            r#"
[admin]
secret = "hunter2"

[identity]
secret = ""
"#,
        );
        let err = ConfigLoader::new(&path, None).load().err().unwrap();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn rejects_out_of_range_code_length() {
        let path = write_config(
            "code-length",
            r#"
[admin]
secret = "hunter2"

[identity]
secret = "k"

[cards]
code_length = 0
"#,
        );
        let err = ConfigLoader::new(&path, None).load().err().unwrap();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn base_url_selects_http_profiles() {
        let path = write_config(
            "profiles",
            r#"
[admin]
secret = "hunter2"

[identity]
secret = "k"

[profiles]
base_url = "http://profiles.internal/"
"#,
        );
        let loaded = ConfigLoader::new(&path, None).load().unwrap();
        assert!(matches!(loaded.profiles, ProfileSource::Http(_)));
    }
}

//! Core configuration types.
//!
//! These are validated runtime values. TOML parsing and validation live in
//! the server crate.

mod config_store;

pub use config_store::ConfigStore;

/// Card pool and claim policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardsConfig {
    /// Whether the first claimant of a card sees the code before the match.
    pub reveal_code_on_claim: bool,
    /// Length of generated card codes.
    pub code_length: usize,
    /// Upper bound for `initialize(count)`.
    pub max_pool_size: u32,
}

impl CardsConfig {
    pub const DEFAULT_CODE_LENGTH: usize = 6;
    pub const DEFAULT_MAX_POOL_SIZE: u32 = 500;
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            reveal_code_on_claim: true,
            code_length: Self::DEFAULT_CODE_LENGTH,
            max_pool_size: Self::DEFAULT_MAX_POOL_SIZE,
        }
    }
}

//! Pool Initializer: creates, inspects and retires card pools.

use crate::config::{CardsConfig, ConfigStore};
use crate::entities::pool_epoch::{PoolEpochRecord, PoolStats};
use crate::store::{PoolStore, StoreError};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Alphabet of generated card codes.
pub const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Pool size {count} is outside 1..={max}")]
    InvalidPoolSize { count: u32, max: u32 },
    #[error("A pool is already active")]
    PoolAlreadyActive,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for PoolError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::PoolAlreadyActive => PoolError::PoolAlreadyActive,
            other => PoolError::Store(other),
        }
    }
}

/// The active pool and its counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatus {
    pub pool: PoolEpochRecord,
    pub stats: PoolStats,
}

/// Generate `count` distinct codes of `length` characters from [`CODE_CHARSET`].
///
/// The caller must make sure `count` does not exceed the number of possible
/// codes; see [`code_space`].
pub fn generate_codes<R: Rng + ?Sized>(rng: &mut R, count: usize, length: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut codes = Vec::with_capacity(count);
    while codes.len() < count {
        let code: String = (0..length)
            .map(|_| char::from(CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())]))
            .collect();
        if seen.insert(code.clone()) {
            codes.push(code);
        }
    }
    codes
}

/// Number of distinct codes of `length` characters, saturating.
pub fn code_space(length: usize) -> u64 {
    u32::try_from(length)
        .ok()
        .and_then(|length| (CODE_CHARSET.len() as u64).checked_pow(length))
        .unwrap_or(u64::MAX)
}

#[derive(Clone)]
pub struct PoolInitializer {
    store: Arc<dyn PoolStore>,
    config: ConfigStore<CardsConfig>,
}

impl PoolInitializer {
    pub fn new(store: Arc<dyn PoolStore>, config: ConfigStore<CardsConfig>) -> Self {
        Self { store, config }
    }

    /// Create a pool of `count` codes, two cards each.
    #[tracing::instrument(skip(self), err)]
    pub async fn initialize(&self, count: u32) -> Result<PoolEpochRecord, PoolError> {
        let config = self.config.snapshot().await;
        let max = config.max_pool_size;
        if count == 0 || count > max || u64::from(count) > code_space(config.code_length) {
            return Err(PoolError::InvalidPoolSize { count, max });
        }

        if self.store.active_pool().await?.is_some() {
            return Err(PoolError::PoolAlreadyActive);
        }

        let codes = generate_codes(&mut rand::rng(), count as usize, config.code_length);
        let pool = self.store.create_pool(&codes).await?;

        tracing::info!(pool_id = %pool.id, cards = pool.card_count, "Card pool initialized");
        Ok(pool)
    }

    /// Retire the active pool without deleting it. `None` if there is none.
    #[tracing::instrument(skip_all, err)]
    pub async fn deactivate(&self) -> Result<Option<PoolEpochRecord>, PoolError> {
        let pool = self.store.deactivate_pool().await?;
        match &pool {
            Some(pool) => tracing::info!(pool_id = %pool.id, "Card pool deactivated"),
            None => tracing::debug!("No active pool to deactivate"),
        }
        Ok(pool)
    }

    pub async fn status(&self) -> Result<Option<PoolStatus>, PoolError> {
        let Some(pool) = self.store.active_pool().await? else {
            return Ok(None);
        };
        let stats = self.store.pool_stats(pool.id).await?;
        Ok(Some(PoolStatus { pool, stats }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn initializer(config: CardsConfig) -> PoolInitializer {
        PoolInitializer::new(Arc::new(MemoryStore::new()), ConfigStore::new(config))
    }

    #[test]
    fn codes_are_distinct_and_well_formed() {
        let mut rng = StdRng::seed_from_u64(7);
        let codes = generate_codes(&mut rng, 200, 6);

        assert_eq!(codes.len(), 200);
        assert_eq!(codes.iter().collect::<HashSet<_>>().len(), 200);
        assert!(codes.iter().all(|code| {
            code.len() == 6 && code.bytes().all(|b| CODE_CHARSET.contains(&b))
        }));
    }

    #[test]
    fn exhausting_a_small_code_space() {
        let mut rng = StdRng::seed_from_u64(1);
        let codes = generate_codes(&mut rng, 36, 1);
        assert_eq!(codes.iter().collect::<HashSet<_>>().len(), 36);
        assert_eq!(code_space(1), 36);
        assert_eq!(code_space(64), u64::MAX);
    }

    #[tokio::test]
    async fn rejects_out_of_range_sizes() {
        let pools = initializer(CardsConfig {
            max_pool_size: 10,
            ..CardsConfig::default()
        });
        assert!(matches!(
            pools.initialize(0).await,
            Err(PoolError::InvalidPoolSize { count: 0, max: 10 })
        ));
        assert!(matches!(
            pools.initialize(11).await,
            Err(PoolError::InvalidPoolSize { count: 11, .. })
        ));
    }

    #[tokio::test]
    async fn rejects_sizes_beyond_code_space() {
        let pools = initializer(CardsConfig {
            code_length: 1,
            ..CardsConfig::default()
        });
        assert!(matches!(
            pools.initialize(37).await,
            Err(PoolError::InvalidPoolSize { .. })
        ));
    }

    #[tokio::test]
    async fn status_reports_active_pool() {
        let pools = initializer(CardsConfig::default());
        assert!(pools.status().await.unwrap().is_none());

        let pool = pools.initialize(3).await.unwrap();
        let status = pools.status().await.unwrap().unwrap();
        assert_eq!(status.pool.id, pool.id);
        assert_eq!(status.stats.card_count, 6);
        assert_eq!(status.stats.claimed_slots, 0);

        assert_eq!(pools.deactivate().await.unwrap().map(|p| p.id), Some(pool.id));
        assert!(pools.status().await.unwrap().is_none());
        assert!(pools.deactivate().await.unwrap().is_none());
    }
}

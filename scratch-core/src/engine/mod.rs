//! The claim/match engine and its collaborators.
//!
//! # Flow
//!
//! 1. [`ClaimEngine::claim`] fills a slot and broadcasts a card update to the
//!    opposite bucket.
//! 2. The call that completes a card runs [`MatchResolver::resolve`].
//! 3. The resolver appends one match notification per claimant to the
//!    [`NotificationLedger`], which pushes each to its owner's channel.

pub mod claim;
pub mod ledger;
pub mod pool;
pub mod resolver;

pub use claim::{ClaimEngine, ClaimError, ClaimOutcome, ClaimStatus};
pub use ledger::{LedgerError, NotificationLedger};
pub use pool::{PoolError, PoolInitializer, PoolStatus};
pub use resolver::{MatchResolver, ResolvedMatch, match_dedup_key};

use crate::config::{CardsConfig, ConfigStore};
use crate::events::Fanout;
use crate::profile::ProfileStore;
use crate::store::{CardStore, NotificationStore, PoolStore, Storage};
use std::sync::Arc;

/// All engine components wired to one storage backend.
#[derive(Clone)]
pub struct ScratchEngine {
    pub claims: ClaimEngine,
    pub ledger: NotificationLedger,
    pub pools: PoolInitializer,
    pub fanout: Fanout,
}

impl ScratchEngine {
    pub fn new<S: Storage + 'static>(
        storage: Arc<S>,
        profiles: Arc<dyn ProfileStore>,
        fanout: Fanout,
        cards_config: ConfigStore<CardsConfig>,
    ) -> Self {
        let card_store: Arc<dyn CardStore> = storage.clone();
        let notification_store: Arc<dyn NotificationStore> = storage.clone();
        let pool_store: Arc<dyn PoolStore> = storage;

        Self::from_parts(
            card_store,
            notification_store,
            pool_store,
            profiles,
            fanout,
            cards_config,
        )
    }

    /// Wire components to separately supplied stores.
    pub fn from_parts(
        card_store: Arc<dyn CardStore>,
        notification_store: Arc<dyn NotificationStore>,
        pool_store: Arc<dyn PoolStore>,
        profiles: Arc<dyn ProfileStore>,
        fanout: Fanout,
        cards_config: ConfigStore<CardsConfig>,
    ) -> Self {
        let ledger = NotificationLedger::new(notification_store, fanout.clone());
        let resolver = MatchResolver::new(profiles, ledger.clone());
        let claims = ClaimEngine::new(card_store, resolver, fanout.clone(), cards_config.clone());
        let pools = PoolInitializer::new(pool_store, cards_config);

        Self {
            claims,
            ledger,
            pools,
            fanout,
        }
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use scratch_core::config::{CardsConfig, ConfigStore};
use scratch_core::engine::ScratchEngine;
use scratch_core::entities::notification::{Appended, NewNotification, NotificationRecord};
use scratch_core::events::Fanout;
use scratch_core::profile::StaticProfileStore;
use scratch_core::store::{MemoryStore, NotificationStore, PoolStore, StoreError};
use scratch_sdk::objects::{Identity, Profile, UserId};
use std::sync::Arc;
use uuid::Uuid;

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub profiles: Arc<StaticProfileStore>,
    pub engine: ScratchEngine,
}

pub fn harness() -> Harness {
    harness_with(CardsConfig::default())
}

pub fn harness_with(config: CardsConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let profiles = Arc::new(StaticProfileStore::new());
    let engine = ScratchEngine::new(
        store.clone(),
        profiles.clone(),
        Fanout::new(),
        ConfigStore::new(config),
    );
    Harness {
        store,
        profiles,
        engine,
    }
}

pub fn profile(user_id: &str, name: &str) -> Profile {
    Profile {
        user_id: UserId::from(user_id),
        name: name.to_owned(),
        age: Some("22".to_owned()),
        course: Some("Physics".to_owned()),
        year: Some("3".to_owned()),
        interests: vec!["climbing".to_owned()],
    }
}

/// Initialize a pool and return the ids of every card, grouped by code.
pub async fn seeded_pool(store: &MemoryStore, codes: &[&str]) -> Vec<(String, Vec<Uuid>)> {
    use scratch_core::store::CardStore;

    let codes: Vec<String> = codes.iter().map(|code| (*code).to_owned()).collect();
    store.create_pool(&codes).await.unwrap();
    let cards = store.list_active_cards().await.unwrap();
    codes
        .into_iter()
        .map(|code| {
            let ids = cards
                .iter()
                .filter(|card| card.code == code)
                .map(|card| card.id)
                .collect();
            (code, ids)
        })
        .collect()
}

pub fn user(id: &str, bucket: scratch_sdk::objects::Bucket) -> Identity {
    Identity::new(id, bucket)
}

/// A notification store whose every call fails.
pub struct UnavailableNotifications;

fn unavailable() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl NotificationStore for UnavailableNotifications {
    async fn append(&self, _: NewNotification) -> Result<Appended, StoreError> {
        Err(unavailable())
    }

    async fn list(&self, _: &UserId) -> Result<Vec<NotificationRecord>, StoreError> {
        Err(unavailable())
    }

    async fn mark_read(&self, _: &UserId, _: Uuid) -> Result<Option<NotificationRecord>, StoreError> {
        Err(unavailable())
    }

    async fn mark_all_read(&self, _: &UserId) -> Result<u64, StoreError> {
        Err(unavailable())
    }

    async fn unread_count(&self, _: &UserId) -> Result<u64, StoreError> {
        Err(unavailable())
    }
}

use super::{CardStore, NotificationStore, PoolStore, StoreError};
use crate::entities::card::CardRecord;
use crate::entities::notification::{Appended, NewNotification, NotificationRecord};
use crate::entities::pool_epoch::{PoolEpochRecord, PoolStats};
use crate::framework::now_utc;
use async_trait::async_trait;
use dashmap::DashMap;
use scratch_sdk::objects::{Bucket, UserId};
use time::PrimitiveDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

/// In-process backend.
///
/// Claim slots are filled under the card's `DashMap` shard lock, so the
/// conditional-update semantics match the Postgres backend. Pool creation
/// and deactivation serialize on a single mutex.
#[derive(Default)]
pub struct MemoryStore {
    cards: DashMap<Uuid, CardRecord>,
    pools: Mutex<Vec<PoolEpochRecord>>,
    notifications: DashMap<String, Vec<NotificationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CardStore for MemoryStore {
    async fn get_card(&self, card_id: Uuid) -> Result<Option<CardRecord>, StoreError> {
        Ok(self.cards.get(&card_id).map(|card| card.clone()))
    }

    async fn list_active_cards(&self) -> Result<Vec<CardRecord>, StoreError> {
        let mut cards: Vec<CardRecord> = self
            .cards
            .iter()
            .filter(|card| card.active)
            .map(|card| card.clone())
            .collect();
        cards.sort_by_key(|card| (card.created_at, card.id));
        Ok(cards)
    }

    async fn claim_slot(
        &self,
        card_id: Uuid,
        bucket: Bucket,
        user_id: &UserId,
        claimed_at: PrimitiveDateTime,
    ) -> Result<Option<CardRecord>, StoreError> {
        let Some(mut card) = self.cards.get_mut(&card_id) else {
            return Ok(None);
        };
        Ok(card
            .try_fill(bucket, user_id, claimed_at)
            .then(|| card.clone()))
    }

    async fn mark_matched(&self, card_id: Uuid) -> Result<Option<CardRecord>, StoreError> {
        let Some(mut card) = self.cards.get_mut(&card_id) else {
            return Ok(None);
        };
        Ok(card.try_mark_matched().then(|| card.clone()))
    }
}

#[async_trait]
impl PoolStore for MemoryStore {
    async fn active_pool(&self) -> Result<Option<PoolEpochRecord>, StoreError> {
        let pools = self.pools.lock().await;
        Ok(pools.iter().find(|pool| pool.active).cloned())
    }

    async fn create_pool(&self, codes: &[String]) -> Result<PoolEpochRecord, StoreError> {
        let mut pools = self.pools.lock().await;
        if pools.iter().any(|pool| pool.active) {
            return Err(StoreError::PoolAlreadyActive);
        }

        let created_at = now_utc();
        let pool = PoolEpochRecord {
            id: Uuid::now_v7(),
            active: true,
            card_count: i32::try_from(codes.len().saturating_mul(2)).unwrap_or(i32::MAX),
            created_at,
            deactivated_at: None,
        };
        for code in codes {
            for _ in 0..2 {
                let card = CardRecord::new(pool.id, code.as_str(), created_at);
                self.cards.insert(card.id, card);
            }
        }
        pools.push(pool.clone());

        Ok(pool)
    }

    async fn deactivate_pool(&self) -> Result<Option<PoolEpochRecord>, StoreError> {
        let mut pools = self.pools.lock().await;
        let Some(pool) = pools.iter_mut().find(|pool| pool.active) else {
            return Ok(None);
        };
        pool.active = false;
        pool.deactivated_at = Some(now_utc());

        for mut card in self.cards.iter_mut() {
            if card.pool_id == pool.id {
                card.active = false;
            }
        }

        Ok(Some(pool.clone()))
    }

    async fn pool_stats(&self, pool_id: Uuid) -> Result<PoolStats, StoreError> {
        let mut stats = PoolStats::default();
        for card in self.cards.iter().filter(|card| card.pool_id == pool_id) {
            stats.card_count += 1;
            stats.claimed_slots +=
                i64::from(card.claim_a_user.is_some()) + i64::from(card.claim_b_user.is_some());
            stats.matched_cards += i64::from(card.matched);
        }
        Ok(stats)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn append(&self, new: NewNotification) -> Result<Appended, StoreError> {
        let mut owned = self
            .notifications
            .entry(new.owner.as_str().to_owned())
            .or_default();

        let existing = new.dedup_key.as_deref().and_then(|key| {
            owned
                .iter()
                .find(|record| record.dedup_key.as_deref() == Some(key))
        });
        if let Some(existing) = existing {
            return Ok(Appended {
                record: existing.clone(),
                created: false,
            });
        }

        let record = new.into_record(Uuid::now_v7(), now_utc());
        owned.push(record.clone());
        Ok(Appended {
            record,
            created: true,
        })
    }

    async fn list(&self, owner: &UserId) -> Result<Vec<NotificationRecord>, StoreError> {
        let mut records = self
            .notifications
            .get(owner.as_str())
            .map(|owned| owned.clone())
            .unwrap_or_default();
        records.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(records)
    }

    async fn mark_read(
        &self,
        owner: &UserId,
        notification_id: Uuid,
    ) -> Result<Option<NotificationRecord>, StoreError> {
        let Some(mut owned) = self.notifications.get_mut(owner.as_str()) else {
            return Ok(None);
        };
        Ok(owned
            .iter_mut()
            .find(|record| record.id == notification_id)
            .map(|record| {
                record.read = true;
                record.clone()
            }))
    }

    async fn mark_all_read(&self, owner: &UserId) -> Result<u64, StoreError> {
        let Some(mut owned) = self.notifications.get_mut(owner.as_str()) else {
            return Ok(0);
        };
        let mut changed = 0;
        for record in owned.iter_mut().filter(|record| !record.read) {
            record.read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn unread_count(&self, owner: &UserId) -> Result<u64, StoreError> {
        Ok(self
            .notifications
            .get(owner.as_str())
            .map(|owned| owned.iter().filter(|record| !record.read).count() as u64)
            .unwrap_or(0))
    }
}

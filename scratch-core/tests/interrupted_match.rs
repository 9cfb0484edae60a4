mod common;

use async_trait::async_trait;
use common::{profile, seeded_pool, user};
use dashmap::DashMap;
use scratch_core::config::{CardsConfig, ConfigStore};
use scratch_core::engine::{ClaimStatus, ScratchEngine};
use scratch_core::entities::card::CardRecord;
use scratch_core::entities::notification::{Appended, NewNotification, NotificationRecord};
use scratch_core::events::Fanout;
use scratch_core::framework::now_utc;
use scratch_core::profile::StaticProfileStore;
use scratch_core::store::{CardStore, MemoryStore, NotificationStore, StoreError};
use scratch_sdk::objects::{Bucket, UserId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use time::PrimitiveDateTime;
use uuid::Uuid;

/// Notification store that can hang its first append or fail every append.
struct GatedNotifications {
    inner: Arc<MemoryStore>,
    hang_next_append: AtomicBool,
    failing: AtomicBool,
}

impl GatedNotifications {
    fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            hang_next_append: AtomicBool::new(false),
            failing: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl NotificationStore for GatedNotifications {
    async fn append(&self, new: NewNotification) -> Result<Appended, StoreError> {
        if self.hang_next_append.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.append(new).await
    }

    async fn list(&self, owner: &UserId) -> Result<Vec<NotificationRecord>, StoreError> {
        self.inner.list(owner).await
    }

    async fn mark_read(
        &self,
        owner: &UserId,
        notification_id: Uuid,
    ) -> Result<Option<NotificationRecord>, StoreError> {
        self.inner.mark_read(owner, notification_id).await
    }

    async fn mark_all_read(&self, owner: &UserId) -> Result<u64, StoreError> {
        self.inner.mark_all_read(owner).await
    }

    async fn unread_count(&self, owner: &UserId) -> Result<u64, StoreError> {
        self.inner.unread_count(owner).await
    }
}

/// Card store that fills slots without ever setting `matched`, like rows
/// written by a two-step claim.
#[derive(Default)]
struct UnflaggedCards {
    cards: DashMap<Uuid, CardRecord>,
}

#[async_trait]
impl CardStore for UnflaggedCards {
    async fn get_card(&self, card_id: Uuid) -> Result<Option<CardRecord>, StoreError> {
        Ok(self.cards.get(&card_id).map(|card| card.clone()))
    }

    async fn list_active_cards(&self) -> Result<Vec<CardRecord>, StoreError> {
        Ok(self
            .cards
            .iter()
            .filter(|card| card.active)
            .map(|card| card.clone())
            .collect())
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
        if !card.try_fill(bucket, user_id, claimed_at) {
            return Ok(None);
        }
        card.matched = false;
        Ok(Some(card.clone()))
    }

    async fn mark_matched(&self, card_id: Uuid) -> Result<Option<CardRecord>, StoreError> {
        let Some(mut card) = self.cards.get_mut(&card_id) else {
            return Ok(None);
        };
        Ok(card.try_mark_matched().then(|| card.clone()))
    }
}

fn profiles() -> Arc<StaticProfileStore> {
    let profiles = StaticProfileStore::new();
    profiles.insert(profile("u1", "Ada"));
    profiles.insert(profile("u2", "Grace"));
    Arc::new(profiles)
}

fn engine_with(store: &Arc<MemoryStore>, notifications: Arc<GatedNotifications>) -> ScratchEngine {
    ScratchEngine::from_parts(
        store.clone(),
        notifications,
        store.clone(),
        profiles(),
        Fanout::new(),
        ConfigStore::new(CardsConfig::default()),
    )
}

async fn match_notes(store: &MemoryStore, owner: &str) -> usize {
    store.list(&UserId::from(owner)).await.unwrap().len()
}

#[tokio::test]
async fn cancelled_claim_after_completing_write_still_matches() {
    let store = Arc::new(MemoryStore::new());
    let notifications = Arc::new(GatedNotifications::new(store.clone()));
    let engine = engine_with(&store, notifications.clone());
    let pool = seeded_pool(&store, &["STALL1"]).await;
    let card_id = pool[0].1[0];
    let u1 = user("u1", Bucket::A);
    let u2 = user("u2", Bucket::B);

    engine.claims.claim(card_id, &u1).await.unwrap();

    notifications.hang_next_append.store(true, Ordering::SeqCst);
    let cancelled =
        tokio::time::timeout(Duration::from_millis(50), engine.claims.claim(card_id, &u2)).await;
    assert!(cancelled.is_err(), "claim should have been cut off while notifying");

    let card = store.get_card(card_id).await.unwrap().unwrap();
    assert!(card.both_claimed());
    assert!(card.matched);

    let u2_again = engine.claims.claim(card_id, &u2).await.unwrap();
    assert!(u2_again.already_claimed());
    assert!(u2_again.matched);
    assert_eq!(u2_again.code.as_deref(), Some("STALL1"));

    let u1_again = engine.claims.claim(card_id, &u1).await.unwrap();
    assert!(u1_again.already_claimed());
    assert!(u1_again.matched);

    assert_eq!(match_notes(&store, "u1").await, 1);
    assert_eq!(match_notes(&store, "u2").await, 1);
}

#[tokio::test]
async fn failed_notifications_are_sent_on_reclaim() {
    let store = Arc::new(MemoryStore::new());
    let notifications = Arc::new(GatedNotifications::new(store.clone()));
    let engine = engine_with(&store, notifications.clone());
    let pool = seeded_pool(&store, &["FAIL01"]).await;
    let card_id = pool[0].1[0];

    engine.claims.claim(card_id, &user("u1", Bucket::A)).await.unwrap();

    notifications.failing.store(true, Ordering::SeqCst);
    let outcome = engine
        .claims
        .claim(card_id, &user("u2", Bucket::B))
        .await
        .unwrap();
    assert!(matches!(outcome.status, ClaimStatus::MatchDetected { .. }));
    assert_eq!(match_notes(&store, "u1").await, 0);
    assert_eq!(match_notes(&store, "u2").await, 0);

    notifications.failing.store(false, Ordering::SeqCst);
    let again = engine
        .claims
        .claim(card_id, &user("u1", Bucket::A))
        .await
        .unwrap();
    assert!(again.already_claimed());
    assert!(again.matched_user.is_none());

    assert_eq!(match_notes(&store, "u1").await, 1);
    assert_eq!(match_notes(&store, "u2").await, 1);
}

#[tokio::test]
async fn filled_card_without_flag_is_repaired_on_reclaim() {
    let store = Arc::new(MemoryStore::new());
    let cards = Arc::new(UnflaggedCards::default());
    let card = CardRecord::new(Uuid::now_v7(), "OLD001", now_utc());
    let card_id = card.id;
    cards.cards.insert(card_id, card);

    let engine = ScratchEngine::from_parts(
        cards.clone(),
        store.clone(),
        store.clone(),
        profiles(),
        Fanout::new(),
        ConfigStore::new(CardsConfig::default()),
    );

    let first = engine.claims.claim(card_id, &user("u1", Bucket::A)).await.unwrap();
    let second = engine.claims.claim(card_id, &user("u2", Bucket::B)).await.unwrap();
    assert_eq!(first.status, ClaimStatus::Pending);
    assert_eq!(second.status, ClaimStatus::Pending);
    assert!(!cards.get_card(card_id).await.unwrap().unwrap().matched);

    let repaired = engine.claims.claim(card_id, &user("u2", Bucket::B)).await.unwrap();
    assert!(repaired.already_claimed());
    assert!(repaired.matched);
    assert!(cards.get_card(card_id).await.unwrap().unwrap().matched);

    assert_eq!(match_notes(&store, "u1").await, 1);
    assert_eq!(match_notes(&store, "u2").await, 1);
}

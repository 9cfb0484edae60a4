//! Storage seams used by the engine.
//!
//! [`DatabaseProcessor`](crate::framework::DatabaseProcessor) implements these
//! by running the storage commands in [`crate::entities`];
//! [`MemoryStore`] implements them over `DashMap`s.

mod memory;
mod postgres;

pub use memory::MemoryStore;

use crate::entities::card::CardRecord;
use crate::entities::notification::{Appended, NewNotification, NotificationRecord};
use crate::entities::pool_epoch::{PoolEpochRecord, PoolStats};
use async_trait::async_trait;
use scratch_sdk::objects::{Bucket, UserId};
use time::PrimitiveDateTime;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("A pool is already active")]
    PoolAlreadyActive,
}

#[async_trait]
pub trait CardStore: Send + Sync {
    async fn get_card(&self, card_id: Uuid) -> Result<Option<CardRecord>, StoreError>;

    async fn list_active_cards(&self) -> Result<Vec<CardRecord>, StoreError>;

    /// Fill `bucket`'s slot on an active card if it is empty.
    ///
    /// Returns the updated card to exactly one of any set of concurrent
    /// callers; `None` to everyone else. The write that fills the second
    /// slot also sets `matched`, so the returned card is matched only for
    /// the caller that completed it.
    async fn claim_slot(
        &self,
        card_id: Uuid,
        bucket: Bucket,
        user_id: &UserId,
        claimed_at: PrimitiveDateTime,
    ) -> Result<Option<CardRecord>, StoreError>;

    /// Set `matched` on a card whose slots are both filled but whose flag
    /// was never set. Returns the card only to the caller that made the
    /// transition.
    async fn mark_matched(&self, card_id: Uuid) -> Result<Option<CardRecord>, StoreError>;
}

#[async_trait]
pub trait PoolStore: Send + Sync {
    async fn active_pool(&self) -> Result<Option<PoolEpochRecord>, StoreError>;

    /// Atomically create an active pool with two cards per code.
    ///
    /// Fails with [`StoreError::PoolAlreadyActive`] if one exists.
    async fn create_pool(&self, codes: &[String]) -> Result<PoolEpochRecord, StoreError>;

    /// Deactivate the active pool and its cards, if any.
    async fn deactivate_pool(&self) -> Result<Option<PoolEpochRecord>, StoreError>;

    async fn pool_stats(&self, pool_id: Uuid) -> Result<PoolStats, StoreError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a notification. With a `dedup_key` already stored for the
    /// same owner, returns that record and `created = false`.
    async fn append(&self, new: NewNotification) -> Result<Appended, StoreError>;

    /// Newest first.
    async fn list(&self, owner: &UserId) -> Result<Vec<NotificationRecord>, StoreError>;

    async fn mark_read(
        &self,
        owner: &UserId,
        notification_id: Uuid,
    ) -> Result<Option<NotificationRecord>, StoreError>;

    async fn mark_all_read(&self, owner: &UserId) -> Result<u64, StoreError>;

    async fn unread_count(&self, owner: &UserId) -> Result<u64, StoreError>;
}

/// Everything the engine needs from one backend.
pub trait Storage: CardStore + PoolStore + NotificationStore {}

impl<T: CardStore + PoolStore + NotificationStore> Storage for T {}

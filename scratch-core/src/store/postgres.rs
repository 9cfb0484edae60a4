use super::{CardStore, NotificationStore, PoolStore, StoreError};
use crate::entities::card::{
    CardRecord, ClaimCardSlot, GetCardById, ListActiveCards, MarkCardMatched,
};
use crate::entities::notification::{
    AppendNotification, Appended, CountUnreadNotifications, ListNotifications,
    MarkAllNotificationsRead, MarkNotificationRead, NewNotification, NotificationRecord,
};
use crate::entities::pool_epoch::{GetActivePoolEpoch, GetPoolStats, PoolEpochRecord, PoolStats};
use crate::framework::{DatabaseProcessor, is_unique_violation};
use async_trait::async_trait;
use kanau::processor::Processor;
use scratch_sdk::objects::{Bucket, UserId};
use time::PrimitiveDateTime;
use uuid::Uuid;

#[async_trait]
impl CardStore for DatabaseProcessor {
    async fn get_card(&self, card_id: Uuid) -> Result<Option<CardRecord>, StoreError> {
        Ok(self.process(GetCardById { card_id }).await?)
    }

    async fn list_active_cards(&self) -> Result<Vec<CardRecord>, StoreError> {
        Ok(self.process(ListActiveCards).await?)
    }

    async fn claim_slot(
        &self,
        card_id: Uuid,
        bucket: Bucket,
        user_id: &UserId,
        claimed_at: PrimitiveDateTime,
    ) -> Result<Option<CardRecord>, StoreError> {
        Ok(self
            .process(ClaimCardSlot {
                card_id,
                bucket,
                user_id: user_id.clone(),
                claimed_at,
            })
            .await?)
    }

    async fn mark_matched(&self, card_id: Uuid) -> Result<Option<CardRecord>, StoreError> {
        Ok(self.process(MarkCardMatched { card_id }).await?)
    }
}

#[async_trait]
impl PoolStore for DatabaseProcessor {
    async fn active_pool(&self) -> Result<Option<PoolEpochRecord>, StoreError> {
        Ok(self.process(GetActivePoolEpoch).await?)
    }

    #[tracing::instrument(skip_all, err, fields(codes = codes.len()))]
    async fn create_pool(&self, codes: &[String]) -> Result<PoolEpochRecord, StoreError> {
        let mut tx = self.begin().await?;

        if PoolEpochRecord::lock_active_tx(&mut tx).await?.is_some() {
            return Err(StoreError::PoolAlreadyActive);
        }

        let card_count = i32::try_from(codes.len().saturating_mul(2)).unwrap_or(i32::MAX);
        let pool = PoolEpochRecord::insert_active_tx(&mut tx, Uuid::now_v7(), card_count)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::PoolAlreadyActive
                } else {
                    StoreError::Database(e)
                }
            })?;

        CardRecord::insert_pairs_tx(&mut tx, pool.id, codes).await?;
        tx.commit().await?;

        Ok(pool)
    }

    #[tracing::instrument(skip_all, err)]
    async fn deactivate_pool(&self) -> Result<Option<PoolEpochRecord>, StoreError> {
        let mut tx = self.begin().await?;

        let Some(pool) = PoolEpochRecord::deactivate_active_tx(&mut tx).await? else {
            return Ok(None);
        };
        let cards = CardRecord::deactivate_for_pool_tx(&mut tx, pool.id).await?;
        tx.commit().await?;

        tracing::debug!(pool_id = %pool.id, cards, "Deactivated pool cards");
        Ok(Some(pool))
    }

    async fn pool_stats(&self, pool_id: Uuid) -> Result<PoolStats, StoreError> {
        Ok(self.process(GetPoolStats { pool_id }).await?)
    }
}

#[async_trait]
impl NotificationStore for DatabaseProcessor {
    async fn append(&self, new: NewNotification) -> Result<Appended, StoreError> {
        Ok(self.process(AppendNotification(new)).await?)
    }

    async fn list(&self, owner: &UserId) -> Result<Vec<NotificationRecord>, StoreError> {
        Ok(self
            .process(ListNotifications {
                owner: owner.clone(),
            })
            .await?)
    }

    async fn mark_read(
        &self,
        owner: &UserId,
        notification_id: Uuid,
    ) -> Result<Option<NotificationRecord>, StoreError> {
        Ok(self
            .process(MarkNotificationRead {
                owner: owner.clone(),
                notification_id,
            })
            .await?)
    }

    async fn mark_all_read(&self, owner: &UserId) -> Result<u64, StoreError> {
        Ok(self
            .process(MarkAllNotificationsRead {
                owner: owner.clone(),
            })
            .await?)
    }

    async fn unread_count(&self, owner: &UserId) -> Result<u64, StoreError> {
        let count = self
            .process(CountUnreadNotifications {
                owner: owner.clone(),
            })
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

//! Notification Ledger: per-user, newest-first notification log.

use crate::entities::notification::{Appended, NewNotification};
use crate::events::{ChannelKey, Fanout, RealtimeEvent};
use crate::store::{NotificationStore, StoreError};
use scratch_sdk::objects::{Notification, UserId};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Notification not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct NotificationLedger {
    store: Arc<dyn NotificationStore>,
    fanout: Fanout,
}

impl NotificationLedger {
    pub fn new(store: Arc<dyn NotificationStore>, fanout: Fanout) -> Self {
        Self { store, fanout }
    }

    /// Persist `new`, then push it to the owner's user channel.
    ///
    /// A repeated dedup key returns the stored record and pushes nothing.
    #[tracing::instrument(skip_all, err, fields(owner = %new.owner))]
    pub async fn append(&self, new: NewNotification) -> Result<Notification, LedgerError> {
        let owner = new.owner.clone();
        let Appended { record, created } = self.store.append(new).await?;
        let notification = Notification::from(record);

        if created {
            self.fanout.broadcast(
                &ChannelKey::User(owner.clone()),
                RealtimeEvent::Notification {
                    user_id: owner,
                    notification: notification.clone(),
                },
            );
        } else {
            tracing::debug!(notification_id = %notification.id, "Duplicate notification suppressed");
        }

        Ok(notification)
    }

    pub async fn list(&self, owner: &UserId) -> Result<Vec<Notification>, LedgerError> {
        let records = self.store.list(owner).await?;
        Ok(records.into_iter().map(Notification::from).collect())
    }

    /// Idempotent. Someone else's notification is reported as not found.
    pub async fn mark_read(
        &self,
        owner: &UserId,
        notification_id: Uuid,
    ) -> Result<Notification, LedgerError> {
        self.store
            .mark_read(owner, notification_id)
            .await?
            .map(Notification::from)
            .ok_or(LedgerError::NotFound)
    }

    /// Returns how many notifications flipped to read.
    pub async fn mark_all_read(&self, owner: &UserId) -> Result<u64, LedgerError> {
        Ok(self.store.mark_all_read(owner).await?)
    }

    pub async fn unread_count(&self, owner: &UserId) -> Result<u64, LedgerError> {
        Ok(self.store.unread_count(owner).await?)
    }
}

//! Keyed broadcast channels.
//!
//! Each [`ChannelKey`] maps to one `tokio::sync::broadcast` sender, created
//! on first subscribe and pruned once its last receiver is gone.

use super::types::{ChannelKey, RealtimeEvent};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Per-channel buffer. A receiver more than this many events behind gets
/// `RecvError::Lagged` and must resync.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

pub type EventReceiver = broadcast::Receiver<RealtimeEvent>;

#[derive(Clone)]
pub struct Fanout {
    channels: Arc<DashMap<ChannelKey, broadcast::Sender<RealtimeEvent>>>,
    capacity: usize,
}

impl Default for Fanout {
    fn default() -> Self {
        Self::new()
    }
}

impl Fanout {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_BUFFER)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self, key: ChannelKey) -> EventReceiver {
        let capacity = self.capacity;
        self.channels
            .entry(key)
            .or_insert_with(|| broadcast::channel(capacity).0)
            .subscribe()
    }

    /// Deliver `event` to every current subscriber of `key`.
    ///
    /// Never blocks. Returns the number of receivers that got the event;
    /// zero when nobody is listening.
    pub fn broadcast(&self, key: &ChannelKey, event: RealtimeEvent) -> usize {
        let delivered = match self.channels.get(key) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => return 0,
        };
        if delivered == 0 {
            self.release(key);
        }
        delivered
    }

    /// Drop the channel for `key` if it has no receivers left.
    ///
    /// Call after dropping a receiver obtained from [`Fanout::subscribe`].
    pub fn release(&self, key: &ChannelKey) {
        self.channels
            .remove_if(key, |_, sender| sender.receiver_count() == 0);
    }

    /// Number of open channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scratch_sdk::objects::Bucket;
    use tokio::sync::broadcast::error::RecvError;
    use uuid::Uuid;

    fn card_update(scratched_by: Bucket) -> RealtimeEvent {
        RealtimeEvent::CardUpdate {
            card_id: Uuid::now_v7(),
            is_locked: true,
            scratched_by,
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_only_matching_key() {
        let fanout = Fanout::new();
        let mut a = fanout.subscribe(ChannelKey::Bucket(Bucket::A));
        let mut b = fanout.subscribe(ChannelKey::Bucket(Bucket::B));

        let event = card_update(Bucket::B);
        assert_eq!(fanout.broadcast(&ChannelKey::Bucket(Bucket::A), event.clone()), 1);

        assert_eq!(a.recv().await.unwrap(), event);
        assert!(b.try_recv().is_err());
    }

    #[test]
    fn broadcast_without_subscribers_is_a_noop() {
        let fanout = Fanout::new();
        assert_eq!(fanout.broadcast(&ChannelKey::Bucket(Bucket::A), card_update(Bucket::B)), 0);
        assert_eq!(fanout.channel_count(), 0);
    }

    #[test]
    fn release_prunes_idle_channels() {
        let fanout = Fanout::new();
        let key = ChannelKey::User("u1".into());
        let rx = fanout.subscribe(key.clone());
        fanout.release(&key);
        assert_eq!(fanout.channel_count(), 1);

        drop(rx);
        fanout.release(&key);
        assert_eq!(fanout.channel_count(), 0);
    }

    #[tokio::test]
    async fn slow_receiver_lags() {
        let fanout = Fanout::with_capacity(2);
        let key = ChannelKey::Bucket(Bucket::B);
        let mut rx = fanout.subscribe(key.clone());
        for _ in 0..5 {
            fanout.broadcast(&key, card_update(Bucket::A));
        }
        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(3))));
    }
}

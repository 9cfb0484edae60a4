//! Event and channel key definitions.

use scratch_sdk::objects::{Bucket, Notification, UserId, WsServerMessage};
use uuid::Uuid;

/// Address of a broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    /// Everyone connected in this bucket.
    Bucket(Bucket),
    /// Every connection of one user.
    User(UserId),
}

impl std::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKey::Bucket(bucket) => write!(f, "bucket:{bucket}"),
            ChannelKey::User(user_id) => write!(f, "user:{user_id}"),
        }
    }
}

/// Something a connected client should hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    /// A slot on `card_id` was claimed by someone in `scratched_by`.
    /// Carries no user id or code.
    CardUpdate {
        card_id: Uuid,
        is_locked: bool,
        scratched_by: Bucket,
    },
    /// A notification was appended for `user_id`.
    Notification {
        user_id: UserId,
        notification: Notification,
    },
}

impl From<RealtimeEvent> for WsServerMessage {
    fn from(event: RealtimeEvent) -> Self {
        match event {
            RealtimeEvent::CardUpdate {
                card_id,
                is_locked,
                scratched_by,
            } => WsServerMessage::CardUpdate {
                card_id,
                is_locked,
                scratched_by,
            },
            RealtimeEvent::Notification {
                user_id,
                notification,
            } => WsServerMessage::Notification {
                user_id,
                notification,
            },
        }
    }
}

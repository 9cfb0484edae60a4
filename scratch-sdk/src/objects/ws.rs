//! WebSocket message types for the realtime stream.
//!
//! `GET /ws` upgrades to a WebSocket connection and pushes
//! [`WsServerMessage`] JSON frames.
//!
//! # Protocol
//!
//! 1. The connection joins the caller's bucket channel and user channel,
//!    then the server sends [`WsServerMessage::Joined`].
//! 2. [`WsServerMessage::CardUpdate`] frames arrive when a card side is
//!    claimed by the opposite bucket.
//! 3. [`WsServerMessage::Notification`] frames arrive when a notification
//!    is appended for the caller.
//! 4. If the connection falls behind, the server drops the missed events
//!    and sends [`WsServerMessage::Resync`]; the client should re-list
//!    cards and notifications.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Bucket, Notification, UserId};

/// Server-to-client WebSocket message.
///
/// ```json
/// {"type":"card_update","cardId":"…","isLocked":true,"scratchedBy":"a"}
/// {"type":"notification","userId":"u1","notification":{ … }}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum WsServerMessage {
    /// First frame of every connection.
    Joined { user_id: UserId, bucket: Bucket },

    /// A side of a card changed state. `scratchedBy` is the bucket of the
    /// claimer, never the user.
    CardUpdate {
        card_id: Uuid,
        is_locked: bool,
        scratched_by: Bucket,
    },

    /// A notification was appended for the connected user.
    Notification {
        user_id: UserId,
        notification: Notification,
    },

    /// Events were dropped; state must be re-fetched over HTTP.
    Resync { reason: String },

    /// A server-side error. A close frame may follow.
    Error { code: u16, reason: String },
}

/// Well-known WebSocket close codes used by the realtime stream.
pub struct WsCloseCode;

impl WsCloseCode {
    pub const NORMAL: u16 = 1000;

    pub const INTERNAL_ERROR: u16 = 1011;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_update_frame_shape() {
        let card_id = Uuid::nil();
        let msg = WsServerMessage::CardUpdate {
            card_id,
            is_locked: true,
            scratched_by: Bucket::A,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "card_update");
        assert_eq!(json["isLocked"], true);
        assert_eq!(json["scratchedBy"], "a");
        assert_eq!(json["cardId"], card_id.to_string());
    }
}

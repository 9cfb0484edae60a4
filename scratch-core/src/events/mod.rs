//! Realtime events and their fanout.
//!
//! # Channels
//!
//! - `bucket:a` / `bucket:b`: card updates caused by the opposite bucket.
//! - `user:{id}`: notifications appended for that user.
//!
//! Events are ephemeral and delivered at most once per live subscriber.
//! A subscriber that falls behind is told to resync over HTTP.

pub mod channels;
pub mod types;

pub use channels::{DEFAULT_CHANNEL_BUFFER, EventReceiver, Fanout};
pub use types::{ChannelKey, RealtimeEvent};

pub mod admin;
pub mod cards;
pub mod notifications;
pub mod ws;

pub use admin::{InitializePoolRequest, PoolEpochResponse, PoolStatusResponse};
pub use cards::{AvailableCard, ClaimCardRequest, ClaimCardResponse, MatchedUser};
pub use notifications::{
    AckResponse, CreateNotificationRequest, MatchMetadata, Notification, NotificationKind,
    UnreadCountResponse,
};
pub use ws::{WsCloseCode, WsServerMessage};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The binary population attribute that decides which side of a card a
/// user may claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    A,
    B,
}

impl Bucket {
    pub fn opposite(self) -> Self {
        match self {
            Bucket::A => Bucket::B,
            Bucket::B => Bucket::A,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::A => "a",
            Bucket::B => "b",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bucket {0:?}")]
pub struct UnknownBucket(pub String);

impl FromStr for Bucket {
    type Err = UnknownBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "A" => Ok(Bucket::A),
            "b" | "B" => Ok(Bucket::B),
            other => Err(UnknownBucket(other.to_owned())),
        }
    }
}

/// Stable user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(CompactString);

impl UserId {
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// An authenticated caller: who they are and which side of a card they play.
///
/// The header form is `{user_id}.{bucket}`. The bucket is always the last
/// dot-separated segment, so user ids may themselves contain dots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub bucket: Bucket,
}

impl Identity {
    pub fn new(user_id: impl Into<UserId>, bucket: Bucket) -> Self {
        Self {
            user_id: user_id.into(),
            bucket,
        }
    }

    pub fn to_header(&self) -> String {
        format!("{}.{}", self.user_id, self.bucket)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityParseError {
    #[error("identity must have the form {{user_id}}.{{bucket}}")]
    InvalidFormat,
    #[error(transparent)]
    Bucket(#[from] UnknownBucket),
}

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user_id, bucket) = s
            .rsplit_once('.')
            .ok_or(IdentityParseError::InvalidFormat)?;
        if user_id.is_empty() {
            return Err(IdentityParseError::InvalidFormat);
        }
        Ok(Self {
            user_id: UserId::new(user_id),
            bucket: bucket.parse()?,
        })
    }
}

/// Public profile served by the profile store.
///
/// Only the fields shown to a match partner are carried; every questionnaire
/// field is optional because users may skip the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

//! Card API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Profile;

/// One active card as seen by a particular caller.
///
/// `code` is only present once the caller has scratched the card.
/// `isLocked` is set when a slot of the card is held by someone other
/// than the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableCard {
    pub id: Uuid,
    pub code: Option<String>,
    pub is_locked: bool,
    pub is_scratched: bool,
    /// Unix timestamp (seconds) of the caller's own claim.
    pub scratched_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimCardRequest {
    pub card_id: Uuid,
}

/// Public summary of a match partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedUser {
    pub name: String,
    pub age: Option<String>,
    pub course: Option<String>,
    pub year: Option<String>,
    pub interests: Vec<String>,
}

impl MatchedUser {
    /// Placeholder used when the partner's profile could not be fetched.
    pub fn anonymous() -> Self {
        Self {
            name: "Anonymous".to_owned(),
            age: None,
            course: None,
            year: None,
            interests: Vec::new(),
        }
    }
}

impl From<Profile> for MatchedUser {
    fn from(profile: Profile) -> Self {
        Self {
            name: profile.name,
            age: profile.age,
            course: profile.course,
            year: profile.year,
            interests: profile.interests,
        }
    }
}

/// Response to `POST /cards/claim`.
///
/// `matchedUser` is only present on the call that completed the card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimCardResponse {
    pub code: Option<String>,
    pub matched: bool,
    pub matched_user: Option<MatchedUser>,
    #[serde(default)]
    pub already_claimed: bool,
}

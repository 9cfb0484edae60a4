//! Match Resolver: turns a completed card into two match notifications.

use super::ledger::NotificationLedger;
use crate::entities::NotificationKind;
use crate::entities::card::CardRecord;
use crate::entities::notification::NewNotification;
use crate::profile::ProfileStore;
use scratch_sdk::objects::{MatchMetadata, MatchedUser, UserId};
use std::sync::Arc;
use uuid::Uuid;

/// Idempotency key of the match notification for `recipient` on `card_id`.
pub fn match_dedup_key(card_id: Uuid, recipient: &UserId) -> String {
    format!("match:{card_id}:{recipient}")
}

/// What each side of a match is shown about the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMatch {
    /// Bucket B's claimant, as shown to bucket A's claimant.
    pub shown_to_a: MatchedUser,
    /// Bucket A's claimant, as shown to bucket B's claimant.
    pub shown_to_b: MatchedUser,
}

#[derive(Clone)]
pub struct MatchResolver {
    profiles: Arc<dyn ProfileStore>,
    ledger: NotificationLedger,
}

impl MatchResolver {
    pub fn new(profiles: Arc<dyn ProfileStore>, ledger: NotificationLedger) -> Self {
        Self { profiles, ledger }
    }

    /// Never fails: profile and ledger errors are logged and the match stands.
    #[tracing::instrument(skip_all, fields(card_id = %card.id))]
    pub async fn resolve(
        &self,
        card: &CardRecord,
        claimant_a: &UserId,
        claimant_b: &UserId,
    ) -> ResolvedMatch {
        let (profile_a, profile_b) =
            tokio::join!(self.public_profile(claimant_a), self.public_profile(claimant_b));

        tokio::join!(
            self.notify(card, claimant_a, &profile_b),
            self.notify(card, claimant_b, &profile_a),
        );

        ResolvedMatch {
            shown_to_a: profile_b,
            shown_to_b: profile_a,
        }
    }

    async fn public_profile(&self, user_id: &UserId) -> MatchedUser {
        match self.profiles.get_profile(user_id).await {
            Ok(Some(profile)) => profile.into(),
            Ok(None) => {
                tracing::warn!(user_id = %user_id, "No profile for matched user");
                MatchedUser::anonymous()
            }
            Err(e) => {
                tracing::error!(error = %e, user_id = %user_id, "Profile lookup failed");
                MatchedUser::anonymous()
            }
        }
    }

    async fn notify(&self, card: &CardRecord, recipient: &UserId, counterpart: &MatchedUser) {
        let metadata = MatchMetadata {
            card_id: card.id,
            code: card.code.clone(),
            matched_user: counterpart.clone(),
        };
        let metadata = match serde_json::to_value(&metadata) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize match metadata");
                None
            }
        };

        let new = NewNotification {
            owner: recipient.clone(),
            kind: NotificationKind::Match,
            message: format!(
                "It's a match! You and {} scratched the same card.",
                counterpart.name
            ),
            metadata,
            dedup_key: Some(match_dedup_key(card.id, recipient)),
        };

        if let Err(e) = self.ledger.append(new).await {
            tracing::error!(
                error = %e,
                recipient = %recipient,
                "Failed to record match notification"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_names_card_and_recipient() {
        let card_id = Uuid::nil();
        assert_eq!(
            match_dedup_key(card_id, &UserId::from("u7")),
            "match:00000000-0000-0000-0000-000000000000:u7"
        );
    }
}

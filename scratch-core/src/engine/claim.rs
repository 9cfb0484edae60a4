//! Claim Engine: the only writer of claim slots.
//!
//! A claim is one conditional write on the caller's slot, and the write that
//! fills the second slot also sets `matched`. Its caller hands the card to
//! the [`MatchResolver`]. Losers re-read the card to tell an idempotent
//! re-claim from a conflict; a re-claim on a matched card resolves it again,
//! which completes notifications an interrupted claim left unsent.

use super::resolver::MatchResolver;
use crate::config::{CardsConfig, ConfigStore};
use crate::entities::card::CardRecord;
use crate::events::{ChannelKey, Fanout, RealtimeEvent};
use crate::framework::now_utc;
use crate::store::{CardStore, StoreError};
use rand::seq::SliceRandom;
use scratch_sdk::objects::{AvailableCard, Bucket, Identity, MatchedUser, UserId};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Card not found or inactive")]
    NotFound,
    #[error("Claim slot is held by another user")]
    Conflict,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimStatus {
    /// The slot was filled; the other slot is still empty.
    Pending,
    /// This call completed the card.
    MatchDetected {
        claimant_a: UserId,
        claimant_b: UserId,
    },
    /// The caller already held this slot. Nothing changed.
    AlreadyClaimedBySelf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOutcome {
    pub card_id: Uuid,
    /// `None` when the reveal policy hides the code until the match.
    pub code: Option<String>,
    pub matched: bool,
    pub status: ClaimStatus,
    /// The caller's counterpart; only set with [`ClaimStatus::MatchDetected`].
    pub matched_user: Option<MatchedUser>,
}

impl ClaimOutcome {
    pub fn already_claimed(&self) -> bool {
        self.status == ClaimStatus::AlreadyClaimedBySelf
    }
}

#[derive(Clone)]
pub struct ClaimEngine {
    cards: Arc<dyn CardStore>,
    resolver: MatchResolver,
    fanout: Fanout,
    config: ConfigStore<CardsConfig>,
}

impl ClaimEngine {
    pub fn new(
        cards: Arc<dyn CardStore>,
        resolver: MatchResolver,
        fanout: Fanout,
        config: ConfigStore<CardsConfig>,
    ) -> Self {
        Self {
            cards,
            resolver,
            fanout,
            config,
        }
    }

    async fn reveal_code_on_claim(&self) -> bool {
        self.config.read().await.reveal_code_on_claim
    }

    /// Active cards as seen by `viewer`, in random order.
    pub async fn available_cards(&self, viewer: &Identity) -> Result<Vec<AvailableCard>, ClaimError> {
        let reveal = self.reveal_code_on_claim().await;
        let mut cards: Vec<AvailableCard> = self
            .cards
            .list_active_cards()
            .await?
            .iter()
            .map(|card| card.view_for(viewer, reveal))
            .collect();
        cards.shuffle(&mut rand::rng());
        Ok(cards)
    }

    #[tracing::instrument(
        skip_all,
        err(level = "debug"),
        fields(card_id = %card_id, bucket = %claimer.bucket)
    )]
    pub async fn claim(&self, card_id: Uuid, claimer: &Identity) -> Result<ClaimOutcome, ClaimError> {
        let Identity { user_id, bucket } = claimer;

        let Some(card) = self
            .cards
            .claim_slot(card_id, *bucket, user_id, now_utc())
            .await?
        else {
            return self.after_lost_write(card_id, claimer).await;
        };

        tracing::debug!("Claim slot filled");
        self.fanout.broadcast(
            &ChannelKey::Bucket(bucket.opposite()),
            RealtimeEvent::CardUpdate {
                card_id,
                is_locked: true,
                scratched_by: *bucket,
            },
        );

        if !card.matched {
            let reveal = self.reveal_code_on_claim().await;
            return Ok(pending(card, reveal));
        }

        let (claimant_a, claimant_b) = claimants(&card)?;
        tracing::info!("Match detected");
        let resolved = self.resolver.resolve(&card, &claimant_a, &claimant_b).await;
        let matched_user = match bucket {
            Bucket::A => resolved.shown_to_a,
            Bucket::B => resolved.shown_to_b,
        };

        Ok(ClaimOutcome {
            card_id,
            code: Some(card.code),
            matched: true,
            status: ClaimStatus::MatchDetected {
                claimant_a,
                claimant_b,
            },
            matched_user: Some(matched_user),
        })
    }

    async fn after_lost_write(
        &self,
        card_id: Uuid,
        claimer: &Identity,
    ) -> Result<ClaimOutcome, ClaimError> {
        let card = self
            .cards
            .get_card(card_id)
            .await?
            .filter(|card| card.active)
            .ok_or(ClaimError::NotFound)?;

        if card.is_claimed_by(claimer.bucket, &claimer.user_id) {
            let card = self.settle_match(card).await?;
            let reveal = self.reveal_code_on_claim().await;
            return Ok(ClaimOutcome {
                card_id,
                code: (reveal || card.matched).then(|| card.code.clone()),
                matched: card.matched,
                status: ClaimStatus::AlreadyClaimedBySelf,
                matched_user: None,
            });
        }

        tracing::warn!(
            card_id = %card_id,
            bucket = %claimer.bucket,
            slot_filled = card.claimant(claimer.bucket).is_some(),
            "Claim lost to another user"
        );
        Err(ClaimError::Conflict)
    }

    /// Bring a card with both slots filled to its matched state and make
    /// sure both claimants were notified.
    ///
    /// Cards filled without the flag get it here. Resolution is repeated on
    /// every call; notification dedup keys keep it from sending twice.
    async fn settle_match(&self, mut card: CardRecord) -> Result<CardRecord, ClaimError> {
        if !card.both_claimed() {
            return Ok(card);
        }
        if !card.matched {
            tracing::warn!(card_id = %card.id, "Both slots filled without a match, repairing");
            if let Some(repaired) = self.cards.mark_matched(card.id).await? {
                card = repaired;
            } else {
                card.matched = true;
            }
        }

        let (claimant_a, claimant_b) = claimants(&card)?;
        tracing::debug!(card_id = %card.id, "Re-resolving matched card");
        self.resolver.resolve(&card, &claimant_a, &claimant_b).await;
        Ok(card)
    }
}

fn claimants(card: &CardRecord) -> Result<(UserId, UserId), ClaimError> {
    match (
        card.claimant(Bucket::A).map(UserId::from),
        card.claimant(Bucket::B).map(UserId::from),
    ) {
        (Some(claimant_a), Some(claimant_b)) => Ok((claimant_a, claimant_b)),
        _ => Err(ClaimError::Conflict),
    }
}

fn pending(card: CardRecord, reveal: bool) -> ClaimOutcome {
    ClaimOutcome {
        card_id: card.id,
        code: reveal.then_some(card.code),
        matched: false,
        status: ClaimStatus::Pending,
        matched_user: None,
    }
}

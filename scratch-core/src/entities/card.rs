use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use scratch_sdk::objects::{AvailableCard, Bucket, Identity, UserId};
use time::PrimitiveDateTime;
use uuid::Uuid;

/// A scratch card with one claim slot per bucket.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CardRecord {
    pub id: Uuid,
    pub pool_id: Uuid,
    pub code: String,
    pub active: bool,
    pub claim_a_user: Option<String>,
    pub claim_a_at: Option<PrimitiveDateTime>,
    pub claim_b_user: Option<String>,
    pub claim_b_at: Option<PrimitiveDateTime>,
    pub matched: bool,
    pub created_at: PrimitiveDateTime,
}

impl CardRecord {
    /// A fresh, active, unclaimed card.
    pub fn new(pool_id: Uuid, code: impl Into<String>, created_at: PrimitiveDateTime) -> Self {
        Self {
            id: Uuid::now_v7(),
            pool_id,
            code: code.into(),
            active: true,
            claim_a_user: None,
            claim_a_at: None,
            claim_b_user: None,
            claim_b_at: None,
            matched: false,
            created_at,
        }
    }

    pub fn claimant(&self, bucket: Bucket) -> Option<&str> {
        match bucket {
            Bucket::A => self.claim_a_user.as_deref(),
            Bucket::B => self.claim_b_user.as_deref(),
        }
    }

    pub fn claimed_at(&self, bucket: Bucket) -> Option<PrimitiveDateTime> {
        match bucket {
            Bucket::A => self.claim_a_at,
            Bucket::B => self.claim_b_at,
        }
    }

    pub fn is_claimed_by(&self, bucket: Bucket, user_id: &UserId) -> bool {
        self.claimant(bucket) == Some(user_id.as_str())
    }

    pub fn both_claimed(&self) -> bool {
        self.claim_a_user.is_some() && self.claim_b_user.is_some()
    }

    /// Fill an empty slot. Returns `false` (and leaves the card untouched)
    /// if the slot is already taken or the card is inactive.
    ///
    /// The fill that completes the card also sets `matched`, so `matched`
    /// after a successful fill means this fill made the match.
    pub fn try_fill(&mut self, bucket: Bucket, user_id: &UserId, at: PrimitiveDateTime) -> bool {
        if !self.active || self.claimant(bucket).is_some() {
            return false;
        }
        let (user, claimed_at) = match bucket {
            Bucket::A => (&mut self.claim_a_user, &mut self.claim_a_at),
            Bucket::B => (&mut self.claim_b_user, &mut self.claim_b_at),
        };
        *user = Some(user_id.as_str().to_owned());
        *claimed_at = Some(at);
        self.matched = self.both_claimed();
        true
    }

    /// Set `matched` if both slots are filled and it was not set yet.
    ///
    /// Only needed for cards whose slots were filled without the flag.
    pub fn try_mark_matched(&mut self) -> bool {
        if self.matched || !self.both_claimed() {
            return false;
        }
        self.matched = true;
        true
    }

    /// The card as listed to `viewer`.
    ///
    /// The code is only shown on the viewer's own scratched card, and before
    /// the match only when `reveal_code_on_claim` allows it.
    pub fn view_for(&self, viewer: &Identity, reveal_code_on_claim: bool) -> AvailableCard {
        let is_scratched = self.is_claimed_by(viewer.bucket, &viewer.user_id);
        let is_locked = [Bucket::A, Bucket::B].into_iter().any(|bucket| {
            self.claimant(bucket)
                .is_some_and(|claimant| claimant != viewer.user_id.as_str())
        });
        let code = (is_scratched && (reveal_code_on_claim || self.matched))
            .then(|| self.code.clone());
        let scratched_at = if is_scratched {
            self.claimed_at(viewer.bucket)
                .map(|at| at.assume_utc().unix_timestamp())
        } else {
            None
        };

        AvailableCard {
            id: self.id,
            code,
            is_locked,
            is_scratched,
            scratched_at,
        }
    }
}

#[derive(Debug, Clone)]
/// Fetch one card by id, active or not.
pub struct GetCardById {
    pub card_id: Uuid,
}

impl Processor<GetCardById> for DatabaseProcessor {
    type Output = Option<CardRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetCardById")]
    async fn process(&self, query: GetCardById) -> Result<Option<CardRecord>, sqlx::Error> {
        sqlx::query_as::<_, CardRecord>("SELECT * FROM cards WHERE id = $1")
            .bind(query.card_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// All cards of the active pool.
pub struct ListActiveCards;

impl Processor<ListActiveCards> for DatabaseProcessor {
    type Output = Vec<CardRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListActiveCards")]
    async fn process(&self, _: ListActiveCards) -> Result<Vec<CardRecord>, sqlx::Error> {
        sqlx::query_as::<_, CardRecord>(
            "SELECT * FROM cards WHERE active ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Fill one claim slot, but only if it is still empty.
///
/// This is a single conditional `UPDATE`: concurrent claims on the same slot
/// serialize on the row lock and exactly one of them sees a returned row.
/// The same statement sets `matched` when the other slot is already filled,
/// and a concurrent claim on the other slot re-reads the committed row, so
/// exactly one claim per card returns `matched = true`.
/// `None` means the card is missing, inactive, or the slot was already taken.
pub struct ClaimCardSlot {
    pub card_id: Uuid,
    pub bucket: Bucket,
    pub user_id: UserId,
    pub claimed_at: PrimitiveDateTime,
}

impl Processor<ClaimCardSlot> for DatabaseProcessor {
    type Output = Option<CardRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ClaimCardSlot")]
    async fn process(&self, cmd: ClaimCardSlot) -> Result<Option<CardRecord>, sqlx::Error> {
        let sql = match cmd.bucket {
            Bucket::A => {
                r#"
                UPDATE cards
                SET claim_a_user = $2, claim_a_at = $3, matched = (claim_b_user IS NOT NULL)
                WHERE id = $1 AND active AND claim_a_user IS NULL
                RETURNING *
                "#
            }
            Bucket::B => {
                r#"
                UPDATE cards
                SET claim_b_user = $2, claim_b_at = $3, matched = (claim_a_user IS NOT NULL)
                WHERE id = $1 AND active AND claim_b_user IS NULL
                RETURNING *
                "#
            }
        };
        sqlx::query_as::<_, CardRecord>(sql)
            .bind(cmd.card_id)
            .bind(cmd.user_id.as_str())
            .bind(cmd.claimed_at)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Flip `matched` to true on a card whose slots are both filled but whose
/// flag is still unset.
///
/// Returns the card only to the single caller whose update flipped the flag.
pub struct MarkCardMatched {
    pub card_id: Uuid,
}

impl Processor<MarkCardMatched> for DatabaseProcessor {
    type Output = Option<CardRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkCardMatched")]
    async fn process(&self, cmd: MarkCardMatched) -> Result<Option<CardRecord>, sqlx::Error> {
        sqlx::query_as::<_, CardRecord>(
            r#"
            UPDATE cards
            SET matched = TRUE
            WHERE id = $1
              AND NOT matched
              AND claim_a_user IS NOT NULL
              AND claim_b_user IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(cmd.card_id)
        .fetch_optional(&self.pool)
        .await
    }
}

impl CardRecord {
    /// Insert two cards per code for a new pool, within a transaction.
    pub async fn insert_pairs_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        pool_id: Uuid,
        codes: &[String],
    ) -> Result<u64, sqlx::Error> {
        if codes.is_empty() {
            return Ok(0);
        }

        let mut query_builder =
            sqlx::QueryBuilder::new("INSERT INTO cards (id, pool_id, code, active) ");

        query_builder.push_values(
            codes.iter().flat_map(|code| [code, code]),
            |mut b, code| {
                b.push_bind(Uuid::now_v7())
                    .push_bind(pool_id)
                    .push_bind(code.as_str())
                    .push_bind(true);
            },
        );

        let result = query_builder.build().execute(&mut **tx).await?;
        Ok(result.rows_affected())
    }

    /// Deactivate every card of a pool, within a transaction.
    pub async fn deactivate_for_pool_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        pool_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE cards SET active = FALSE WHERE pool_id = $1 AND active")
            .bind(pool_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::now_utc;

    fn card() -> CardRecord {
        CardRecord::new(Uuid::now_v7(), "K7Q2ZP", now_utc())
    }

    #[test]
    fn slot_fills_once() {
        let mut card = card();
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        assert!(card.try_fill(Bucket::A, &alice, now_utc()));
        assert!(!card.try_fill(Bucket::A, &bob, now_utc()));
        assert!(!card.try_fill(Bucket::A, &alice, now_utc()));
        assert_eq!(card.claimant(Bucket::A), Some("alice"));
        assert!(!card.both_claimed());
    }

    #[test]
    fn inactive_card_cannot_be_filled() {
        let mut card = card();
        card.active = false;
        assert!(!card.try_fill(Bucket::B, &UserId::from("bob"), now_utc()));
    }

    #[test]
    fn completing_fill_sets_matched() {
        let mut card = card();
        assert!(card.try_fill(Bucket::B, &UserId::from("bob"), now_utc()));
        assert!(!card.matched);
        assert!(card.try_fill(Bucket::A, &UserId::from("alice"), now_utc()));
        assert!(card.matched);
        assert!(!card.try_mark_matched());
    }

    #[test]
    fn matched_flips_once_on_filled_card() {
        let mut card = card();
        assert!(!card.try_mark_matched());
        card.claim_a_user = Some("alice".to_owned());
        assert!(!card.try_mark_matched());
        card.claim_b_user = Some("bob".to_owned());
        assert!(card.try_mark_matched());
        assert!(!card.try_mark_matched());
        assert!(card.matched);
    }

    #[test]
    fn view_hides_code_and_claimer_from_others() {
        let mut card = card();
        let alice = Identity::new("alice", Bucket::A);
        let bob = Identity::new("bob", Bucket::B);
        card.try_fill(Bucket::A, &alice.user_id, now_utc());

        let own = card.view_for(&alice, true);
        assert!(own.is_scratched);
        assert!(!own.is_locked);
        assert_eq!(own.code.as_deref(), Some("K7Q2ZP"));
        assert!(own.scratched_at.is_some());

        let other = card.view_for(&bob, true);
        assert!(!other.is_scratched);
        assert!(other.is_locked);
        assert_eq!(other.code, None);
        assert_eq!(other.scratched_at, None);
    }

    #[test]
    fn view_respects_reveal_policy_until_match() {
        let mut card = card();
        let alice = Identity::new("alice", Bucket::A);
        card.try_fill(Bucket::A, &alice.user_id, now_utc());
        assert_eq!(card.view_for(&alice, false).code, None);

        card.try_fill(Bucket::B, &UserId::from("bob"), now_utc());
        assert_eq!(card.view_for(&alice, false).code.as_deref(), Some("K7Q2ZP"));
    }
}

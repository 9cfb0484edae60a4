use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use scratch_sdk::objects::PoolEpochResponse;
use time::PrimitiveDateTime;
use uuid::Uuid;

/// One generation of the card pool. At most one row is `active`; the
/// database enforces that with a partial unique index.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PoolEpochRecord {
    pub id: Uuid,
    pub active: bool,
    pub card_count: i32,
    pub created_at: PrimitiveDateTime,
    pub deactivated_at: Option<PrimitiveDateTime>,
}

impl From<PoolEpochRecord> for PoolEpochResponse {
    fn from(value: PoolEpochRecord) -> Self {
        Self {
            id: value.id,
            active: value.active,
            card_count: value.card_count,
            created_at: value.created_at.assume_utc().unix_timestamp(),
            deactivated_at: value
                .deactivated_at
                .map(|at| at.assume_utc().unix_timestamp()),
        }
    }
}

/// Aggregate counters for one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, sqlx::FromRow)]
pub struct PoolStats {
    pub card_count: i64,
    pub claimed_slots: i64,
    pub matched_cards: i64,
}

#[derive(Debug, Clone)]
pub struct GetActivePoolEpoch;

impl Processor<GetActivePoolEpoch> for DatabaseProcessor {
    type Output = Option<PoolEpochRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetActivePoolEpoch")]
    async fn process(&self, _: GetActivePoolEpoch) -> Result<Option<PoolEpochRecord>, sqlx::Error> {
        sqlx::query_as::<_, PoolEpochRecord>("SELECT * FROM pool_epochs WHERE active")
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct GetPoolStats {
    pub pool_id: Uuid,
}

impl Processor<GetPoolStats> for DatabaseProcessor {
    type Output = PoolStats;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPoolStats")]
    async fn process(&self, query: GetPoolStats) -> Result<PoolStats, sqlx::Error> {
        sqlx::query_as::<_, PoolStats>(
            r#"
            SELECT
                COUNT(*) AS card_count,
                COUNT(claim_a_user) + COUNT(claim_b_user) AS claimed_slots,
                COUNT(*) FILTER (WHERE matched) AS matched_cards
            FROM cards
            WHERE pool_id = $1
            "#,
        )
        .bind(query.pool_id)
        .fetch_one(&self.pool)
        .await
    }
}

impl PoolEpochRecord {
    /// Lock the active pool row (if any) for the rest of the transaction.
    pub async fn lock_active_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Option<PoolEpochRecord>, sqlx::Error> {
        sqlx::query_as::<_, PoolEpochRecord>("SELECT * FROM pool_epochs WHERE active FOR UPDATE")
            .fetch_optional(&mut **tx)
            .await
    }

    /// Insert a new active pool. Fails with a unique violation if another
    /// active pool committed first.
    pub async fn insert_active_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
        card_count: i32,
    ) -> Result<PoolEpochRecord, sqlx::Error> {
        sqlx::query_as::<_, PoolEpochRecord>(
            r#"
            INSERT INTO pool_epochs (id, active, card_count)
            VALUES ($1, TRUE, $2)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(card_count)
        .fetch_one(&mut **tx)
        .await
    }

    pub async fn deactivate_active_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Option<PoolEpochRecord>, sqlx::Error> {
        sqlx::query_as::<_, PoolEpochRecord>(
            r#"
            UPDATE pool_epochs
            SET active = FALSE, deactivated_at = (NOW() AT TIME ZONE 'utc')
            WHERE active
            RETURNING *
            "#,
        )
        .fetch_optional(&mut **tx)
        .await
    }
}

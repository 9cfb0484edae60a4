use crate::entities::NotificationKind;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use scratch_sdk::objects::{Notification, UserId};
use time::PrimitiveDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub owner: String,
    pub kind: NotificationKind,
    pub message: String,
    pub metadata: Option<serde_json::Value>,
    pub read: bool,
    pub created_at: PrimitiveDateTime,
    pub dedup_key: Option<String>,
}

impl From<NotificationRecord> for Notification {
    fn from(value: NotificationRecord) -> Self {
        Self {
            id: value.id,
            user_id: UserId::from(value.owner),
            kind: value.kind.into(),
            message: value.message,
            metadata: value.metadata,
            read: value.read,
            created_at: value.created_at.assume_utc().unix_timestamp(),
        }
    }
}

/// A notification to be appended.
///
/// When `dedup_key` is set, appending twice with the same owner and key
/// yields the first record instead of a second one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub owner: UserId,
    pub kind: NotificationKind,
    pub message: String,
    pub metadata: Option<serde_json::Value>,
    pub dedup_key: Option<String>,
}

impl NewNotification {
    pub fn into_record(self, id: Uuid, created_at: PrimitiveDateTime) -> NotificationRecord {
        NotificationRecord {
            id,
            owner: self.owner.as_str().to_owned(),
            kind: self.kind,
            message: self.message,
            metadata: self.metadata,
            read: false,
            created_at,
            dedup_key: self.dedup_key,
        }
    }
}

/// Result of an append: the stored record and whether this call created it.
#[derive(Debug, Clone, PartialEq)]
pub struct Appended {
    pub record: NotificationRecord,
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct AppendNotification(pub NewNotification);

impl Processor<AppendNotification> for DatabaseProcessor {
    type Output = Appended;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:AppendNotification")]
    async fn process(&self, cmd: AppendNotification) -> Result<Appended, sqlx::Error> {
        let new = cmd.0;
        let inserted = sqlx::query_as::<_, NotificationRecord>(
            r#"
            INSERT INTO notifications (id, owner, kind, message, metadata, dedup_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (owner, dedup_key) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(new.owner.as_str())
        .bind(new.kind)
        .bind(&new.message)
        .bind(&new.metadata)
        .bind(new.dedup_key.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(record) = inserted {
            return Ok(Appended {
                record,
                created: true,
            });
        }

        // Only a dedup-key conflict leaves nothing inserted.
        let record = sqlx::query_as::<_, NotificationRecord>(
            "SELECT * FROM notifications WHERE owner = $1 AND dedup_key = $2",
        )
        .bind(new.owner.as_str())
        .bind(new.dedup_key.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(Appended {
            record,
            created: false,
        })
    }
}

#[derive(Debug, Clone)]
/// Newest first.
pub struct ListNotifications {
    pub owner: UserId,
}

impl Processor<ListNotifications> for DatabaseProcessor {
    type Output = Vec<NotificationRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListNotifications")]
    async fn process(&self, query: ListNotifications) -> Result<Vec<NotificationRecord>, sqlx::Error> {
        sqlx::query_as::<_, NotificationRecord>(
            r#"
            SELECT * FROM notifications
            WHERE owner = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(query.owner.as_str())
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Scoped to the owner: another user's id behaves like a missing one.
pub struct MarkNotificationRead {
    pub owner: UserId,
    pub notification_id: Uuid,
}

impl Processor<MarkNotificationRead> for DatabaseProcessor {
    type Output = Option<NotificationRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkNotificationRead")]
    async fn process(
        &self,
        cmd: MarkNotificationRead,
    ) -> Result<Option<NotificationRecord>, sqlx::Error> {
        sqlx::query_as::<_, NotificationRecord>(
            r#"
            UPDATE notifications SET read = TRUE
            WHERE id = $1 AND owner = $2
            RETURNING *
            "#,
        )
        .bind(cmd.notification_id)
        .bind(cmd.owner.as_str())
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
pub struct MarkAllNotificationsRead {
    pub owner: UserId,
}

impl Processor<MarkAllNotificationsRead> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkAllNotificationsRead")]
    async fn process(&self, cmd: MarkAllNotificationsRead) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE owner = $1 AND NOT read")
                .bind(cmd.owner.as_str())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
pub struct CountUnreadNotifications {
    pub owner: UserId,
}

impl Processor<CountUnreadNotifications> for DatabaseProcessor {
    type Output = i64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CountUnreadNotifications")]
    async fn process(&self, query: CountUnreadNotifications) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE owner = $1 AND NOT read",
        )
        .bind(query.owner.as_str())
        .fetch_one(&self.pool)
        .await
    }
}

use crate::domain::notification::{Notification, NotificationKind};
use crate::error::Result;
use crate::storage::records;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct NotificationRepository;

impl NotificationRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        message_id: Uuid,
        kind: NotificationKind,
        body: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, message_id, kind, body)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(message_id)
        .bind(kind.as_str())
        .bind(body)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn list_for_user(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        unread_only: bool,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, records::Notification>(
            r#"
            SELECT id, user_id, message_id, kind, body, is_read, created_at
            FROM notifications
            WHERE user_id = $1
              AND ($2 = FALSE OR is_read = FALSE)
              AND ($3::timestamptz IS NULL OR (created_at, id) < ($3, $4))
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(cursor.map(|(ts, _)| ts))
        .bind(cursor.map(|(_, id)| id))
        .bind(limit)
        .fetch_all(conn)
        .await?;

        Ok(notifications.into_iter().map(Into::into).collect())
    }

    /// Marks one notification read, only for its owner.
    pub async fn mark_read(&self, conn: &mut PgConnection, notification_id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(notification_id)
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn mark_all_read(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE")
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn unread_count(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE")
                .bind(user_id)
                .fetch_one(conn)
                .await?;
        Ok(count)
    }

    pub async fn count_for_user(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(conn)
            .await?;
        Ok(count)
    }

    /// Leases a batch of undelivered notifications for the dispatch worker,
    /// oldest first. `FOR UPDATE SKIP LOCKED` keeps concurrent workers from
    /// double-delivering.
    pub async fn fetch_undelivered(&self, conn: &mut PgConnection, limit: i64) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, records::Notification>(
            r#"
            SELECT id, user_id, message_id, kind, body, is_read, created_at
            FROM notifications
            WHERE delivered_at IS NULL
            ORDER BY created_at ASC
            LIMIT $1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(limit)
        .fetch_all(conn)
        .await?;

        Ok(notifications.into_iter().map(Into::into).collect())
    }

    pub async fn mark_delivered(&self, conn: &mut PgConnection, notification_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE notifications SET delivered_at = NOW() WHERE id = $1")
            .bind(notification_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}

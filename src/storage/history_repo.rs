use crate::domain::history::MessageHistory;
use crate::error::Result;
use crate::storage::records;
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct HistoryRepository;

impl HistoryRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        message_id: Uuid,
        old_content: &str,
        edited_by: Uuid,
        edit_reason: &str,
    ) -> Result<MessageHistory> {
        let entry = sqlx::query_as::<_, records::MessageHistory>(
            r#"
            INSERT INTO message_history (message_id, old_content, edited_by, edit_reason)
            VALUES ($1, $2, $3, $4)
            RETURNING id, message_id, old_content, edited_by, edited_at, edit_reason
            "#,
        )
        .bind(message_id)
        .bind(old_content)
        .bind(edited_by)
        .bind(edit_reason)
        .fetch_one(conn)
        .await?;

        Ok(entry.into())
    }

    /// Edit history for a message, newest first.
    pub async fn list_for_message(&self, conn: &mut PgConnection, message_id: Uuid) -> Result<Vec<MessageHistory>> {
        let entries = sqlx::query_as::<_, records::MessageHistory>(
            r#"
            SELECT id, message_id, old_content, edited_by, edited_at, edit_reason
            FROM message_history
            WHERE message_id = $1
            ORDER BY edited_at DESC, id DESC
            "#,
        )
        .bind(message_id)
        .fetch_all(conn)
        .await?;

        Ok(entries.into_iter().map(Into::into).collect())
    }

    pub async fn count_for_user(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM message_history WHERE edited_by = $1")
            .bind(user_id)
            .fetch_one(conn)
            .await?;
        Ok(count)
    }
}

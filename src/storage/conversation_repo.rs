use crate::domain::conversation::{Conversation, Participant};
use crate::error::Result;
use crate::storage::records;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct ConversationRepository;

impl ConversationRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    pub async fn create(&self, conn: &mut PgConnection, title: &str) -> Result<Conversation> {
        let conversation = sqlx::query_as::<_, records::Conversation>(
            r#"
            INSERT INTO conversations (title)
            VALUES ($1)
            RETURNING id, title, created_at, updated_at
            "#,
        )
        .bind(title)
        .fetch_one(conn)
        .await?;

        Ok(conversation.into())
    }

    pub async fn find_by_id(&self, conn: &mut PgConnection, conversation_id: Uuid) -> Result<Option<Conversation>> {
        let conversation = sqlx::query_as::<_, records::Conversation>(
            r#"
            SELECT id, title, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(conn)
        .await?;

        Ok(conversation.map(Into::into))
    }

    /// Lists a user's conversations, most recently active first.
    pub async fn list_for_user(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Conversation>> {
        let conversations = sqlx::query_as::<_, records::Conversation>(
            r#"
            SELECT c.id, c.title, c.created_at, c.updated_at
            FROM conversations c
            JOIN conversation_participants p ON p.conversation_id = c.id
            WHERE p.user_id = $1
              AND ($2::timestamptz IS NULL OR (c.updated_at, c.id) < ($2, $3))
            ORDER BY c.updated_at DESC, c.id DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(cursor.map(|(ts, _)| ts))
        .bind(cursor.map(|(_, id)| id))
        .bind(limit)
        .fetch_all(conn)
        .await?;

        Ok(conversations.into_iter().map(Into::into).collect())
    }

    pub async fn add_participant(&self, conn: &mut PgConnection, conversation_id: Uuid, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO conversation_participants (conversation_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn remove_participant(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM conversation_participants WHERE conversation_id = $1 AND user_id = $2")
                .bind(conversation_id)
                .bind(user_id)
                .execute(conn)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn is_participant(&self, conn: &mut PgConnection, conversation_id: Uuid, user_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM conversation_participants WHERE conversation_id = $1 AND user_id = $2)",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
        Ok(exists)
    }

    pub async fn participants(&self, conn: &mut PgConnection, conversation_id: Uuid) -> Result<Vec<Participant>> {
        let participants = sqlx::query_as::<_, records::Participant>(
            r#"
            SELECT p.user_id, u.username, p.joined_at
            FROM conversation_participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.conversation_id = $1
            ORDER BY p.joined_at ASC
            "#,
        )
        .bind(conversation_id)
        .fetch_all(conn)
        .await?;

        Ok(participants.into_iter().map(Into::into).collect())
    }

    pub async fn participant_ids(&self, conn: &mut PgConnection, conversation_id: Uuid) -> Result<Vec<Uuid>> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM conversation_participants WHERE conversation_id = $1")
                .bind(conversation_id)
                .fetch_all(conn)
                .await?;
        Ok(ids)
    }

    /// Advances `updated_at` so the conversation sorts as recently active.
    pub async fn touch(&self, conn: &mut PgConnection, conversation_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE conversations SET updated_at = NOW() WHERE id = $1")
            .bind(conversation_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, conn: &mut PgConnection, conversation_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1").bind(conversation_id).execute(conn).await?;
        Ok(result.rows_affected())
    }
}

use crate::domain::message::Message;
use crate::error::{AppError, Result};
use crate::storage::records;
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

const MESSAGE_COLUMNS: &str = r"
    m.id, m.conversation_id, m.sender_id, u.username AS sender_username,
    m.content, m.created_at, m.is_read, m.edited, m.last_edited_at,
    m.edit_count, m.parent_id, m.root_id, m.thread_depth
";

/// Optional predicates for conversation message listings.
#[derive(Clone, Debug, Default)]
pub struct MessageFilters {
    pub sent_after: Option<OffsetDateTime>,
    pub sent_before: Option<OffsetDateTime>,
    pub sender_id: Option<Uuid>,
    pub is_read: Option<bool>,
    pub content_query: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MessageRepository;

impl MessageRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Stores a message, deriving `thread_depth` and `root_id` from the
    /// parent when this is a reply.
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
        parent: Option<&Message>,
    ) -> Result<Message> {
        let (parent_id, root_id, thread_depth) = match parent {
            Some(p) => (Some(p.id), Some(p.thread_root()), p.thread_depth + 1),
            None => (None, None, 0),
        };

        let message_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO messages (conversation_id, sender_id, content, parent_id, root_id, thread_depth)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .bind(parent_id)
        .bind(root_id)
        .bind(thread_depth)
        .fetch_one(&mut *conn)
        .await?;

        self.find_by_id(conn, message_id).await?.ok_or(AppError::Internal)
    }

    pub async fn find_by_id(&self, conn: &mut PgConnection, message_id: Uuid) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, records::Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages m JOIN users u ON u.id = m.sender_id WHERE m.id = $1"
        ))
        .bind(message_id)
        .fetch_optional(conn)
        .await?;

        Ok(message.map(Into::into))
    }

    /// Like `find_by_id` but takes a row lock, for the edit transaction.
    pub async fn lock_by_id(&self, conn: &mut PgConnection, message_id: Uuid) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, records::Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages m JOIN users u ON u.id = m.sender_id WHERE m.id = $1 FOR UPDATE OF m"
        ))
        .bind(message_id)
        .fetch_optional(conn)
        .await?;

        Ok(message.map(Into::into))
    }

    pub async fn list_for_conversation(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        filters: &MessageFilters,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Message>> {
        let mut qb = sqlx::QueryBuilder::new(format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages m JOIN users u ON u.id = m.sender_id WHERE m.conversation_id = "
        ));
        qb.push_bind(conversation_id);

        if let Some(after) = filters.sent_after {
            qb.push(" AND m.created_at >= ").push_bind(after);
        }
        if let Some(before) = filters.sent_before {
            qb.push(" AND m.created_at <= ").push_bind(before);
        }
        if let Some(sender_id) = filters.sender_id {
            qb.push(" AND m.sender_id = ").push_bind(sender_id);
        }
        if let Some(is_read) = filters.is_read {
            qb.push(" AND m.is_read = ").push_bind(is_read);
        }
        if let Some(query) = &filters.content_query {
            qb.push(" AND m.content ILIKE ").push_bind(format!("%{query}%"));
        }
        if let Some((ts, id)) = cursor {
            qb.push(" AND (m.created_at, m.id) < (").push_bind(ts).push(", ").push_bind(id).push(")");
        }

        qb.push(" ORDER BY m.created_at DESC, m.id DESC LIMIT ").push_bind(limit);

        let messages = qb.build_query_as::<records::Message>().fetch_all(conn).await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    /// Every message of a thread: the root plus everything pointing at it,
    /// ordered for tree building.
    pub async fn thread_messages(&self, conn: &mut PgConnection, root_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, records::Message>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages m JOIN users u ON u.id = m.sender_id
            WHERE m.id = $1 OR m.root_id = $1
            ORDER BY m.thread_depth ASC, m.created_at ASC
            "#
        ))
        .bind(root_id)
        .fetch_all(conn)
        .await?;

        Ok(messages.into_iter().map(Into::into).collect())
    }

    /// The cross-conversation unread inbox: unread messages addressed to the
    /// user (sent by someone else in a conversation they participate in).
    pub async fn unread_page(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, records::Message>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages m
            JOIN users u ON u.id = m.sender_id
            JOIN conversation_participants p
              ON p.conversation_id = m.conversation_id AND p.user_id = $1
            WHERE m.sender_id <> $1 AND m.is_read = FALSE
              AND ($2::timestamptz IS NULL OR (m.created_at, m.id) < ($2, $3))
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $4
            "#
        ))
        .bind(user_id)
        .bind(cursor.map(|(ts, _)| ts))
        .bind(cursor.map(|(_, id)| id))
        .bind(limit)
        .fetch_all(conn)
        .await?;

        Ok(messages.into_iter().map(Into::into).collect())
    }

    pub(crate) async fn unread_aggregate(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<records::message::UnreadAggregate> {
        let aggregate = sqlx::query_as::<_, records::message::UnreadAggregate>(
            r#"
            SELECT COUNT(*) AS total_unread,
                   COUNT(DISTINCT m.sender_id) AS unique_senders,
                   MIN(m.created_at) AS oldest_unread,
                   MAX(m.created_at) AS newest_unread
            FROM messages m
            JOIN conversation_participants p
              ON p.conversation_id = m.conversation_id AND p.user_id = $1
            WHERE m.sender_id <> $1 AND m.is_read = FALSE
            "#,
        )
        .bind(user_id)
        .fetch_one(conn)
        .await?;

        Ok(aggregate)
    }

    pub(crate) async fn received_stats(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<records::message::ReceivedStats> {
        let stats = sqlx::query_as::<_, records::message::ReceivedStats>(
            r#"
            SELECT COUNT(*) AS total_received,
                   COUNT(*) FILTER (WHERE m.is_read) AS read_received
            FROM messages m
            JOIN conversation_participants p
              ON p.conversation_id = m.conversation_id AND p.user_id = $1
            WHERE m.sender_id <> $1
            "#,
        )
        .bind(user_id)
        .fetch_one(conn)
        .await?;

        Ok(stats)
    }

    pub async fn sent_count(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE sender_id = $1")
            .bind(user_id)
            .fetch_one(conn)
            .await?;
        Ok(count)
    }

    pub async fn mark_read(&self, conn: &mut PgConnection, message_id: Uuid) -> Result<u64> {
        let result = sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = $1 AND is_read = FALSE")
            .bind(message_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Marks every unread message in a conversation read for the viewer.
    pub async fn mark_conversation_read(
        &self,
        conn: &mut PgConnection,
        conversation_id: Uuid,
        viewer_id: Uuid,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE
            WHERE conversation_id = $1 AND sender_id <> $2 AND is_read = FALSE
            "#,
        )
        .bind(conversation_id)
        .bind(viewer_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn apply_edit(&self, conn: &mut PgConnection, message_id: Uuid, new_content: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE messages
            SET content = $2, edited = TRUE, last_edited_at = NOW(), edit_count = edit_count + 1
            WHERE id = $1
            "#,
        )
        .bind(message_id)
        .bind(new_content)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, conn: &mut PgConnection, message_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1").bind(message_id).execute(conn).await?;
        Ok(result.rows_affected())
    }

    /// One sweeper batch: marks up to `limit` unread messages older than the
    /// cutoff as read, returning how many rows were touched.
    pub async fn mark_old_unread_read(
        &self,
        conn: &mut PgConnection,
        cutoff: OffsetDateTime,
        limit: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE
            WHERE id IN (
                SELECT id FROM messages
                WHERE is_read = FALSE AND created_at < $1
                ORDER BY created_at ASC
                LIMIT $2
            )
            "#,
        )
        .bind(cutoff)
        .bind(limit)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}

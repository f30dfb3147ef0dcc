use time::OffsetDateTime;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub is_read: bool,
    pub edited: bool,
    pub last_edited_at: Option<OffsetDateTime>,
    pub edit_count: i32,
    pub parent_id: Option<Uuid>,
    pub root_id: Option<Uuid>,
    pub thread_depth: i32,
}

impl From<Message> for crate::domain::message::Message {
    fn from(record: Message) -> Self {
        Self {
            id: record.id,
            conversation_id: record.conversation_id,
            sender_id: record.sender_id,
            sender_username: record.sender_username,
            content: record.content,
            created_at: record.created_at,
            is_read: record.is_read,
            edited: record.edited,
            last_edited_at: record.last_edited_at,
            edit_count: record.edit_count,
            parent_id: record.parent_id,
            root_id: record.root_id,
            thread_depth: record.thread_depth,
        }
    }
}

/// Aggregates over a user's unread inbox.
#[derive(sqlx::FromRow)]
pub(crate) struct UnreadAggregate {
    pub total_unread: i64,
    pub unique_senders: i64,
    pub oldest_unread: Option<OffsetDateTime>,
    pub newest_unread: Option<OffsetDateTime>,
}

#[derive(sqlx::FromRow)]
pub(crate) struct ReceivedStats {
    pub total_received: i64,
    pub read_received: i64,
}

use time::OffsetDateTime;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct MessageHistory {
    pub id: Uuid,
    pub message_id: Uuid,
    pub old_content: String,
    pub edited_by: Uuid,
    pub edited_at: OffsetDateTime,
    pub edit_reason: String,
}

impl From<MessageHistory> for crate::domain::history::MessageHistory {
    fn from(record: MessageHistory) -> Self {
        Self {
            id: record.id,
            message_id: record.message_id,
            old_content: record.old_content,
            edited_by: record.edited_by,
            edited_at: record.edited_at,
            edit_reason: record.edit_reason,
        }
    }
}

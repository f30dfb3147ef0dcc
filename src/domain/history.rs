use time::OffsetDateTime;
use uuid::Uuid;

/// A snapshot of a message's content as it was before one edit.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    pub(crate) id: Uuid,
    pub(crate) message_id: Uuid,
    pub(crate) old_content: String,
    pub(crate) edited_by: Uuid,
    pub(crate) edited_at: OffsetDateTime,
    pub(crate) edit_reason: String,
}

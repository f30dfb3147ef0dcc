use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Conversation {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) created_at: Option<OffsetDateTime>,
    pub(crate) updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub(crate) user_id: Uuid,
    pub(crate) username: String,
    pub(crate) joined_at: OffsetDateTime,
}

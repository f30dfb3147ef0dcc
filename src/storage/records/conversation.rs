use time::OffsetDateTime;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: OffsetDateTime,
}

impl From<Conversation> for crate::domain::conversation::Conversation {
    fn from(record: Conversation) -> Self {
        Self {
            id: record.id,
            title: record.title,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct Participant {
    pub user_id: Uuid,
    pub username: String,
    pub joined_at: OffsetDateTime,
}

impl From<Participant> for crate::domain::conversation::Participant {
    fn from(record: Participant) -> Self {
        Self { user_id: record.user_id, username: record.username, joined_at: record.joined_at }
    }
}

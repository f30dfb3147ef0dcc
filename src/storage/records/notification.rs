use crate::domain::notification::NotificationKind;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
pub(crate) struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message_id: Option<Uuid>,
    pub kind: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: OffsetDateTime,
}

impl From<Notification> for crate::domain::notification::Notification {
    fn from(record: Notification) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id,
            message_id: record.message_id,
            // Unknown kinds cannot appear: the column is only ever written
            // through NotificationKind::as_str.
            kind: record.kind.parse().unwrap_or(NotificationKind::NewMessage),
            body: record.body,
            is_read: record.is_read,
            created_at: record.created_at,
        }
    }
}

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub is_staff: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl From<crate::domain::user::User> for Profile {
    fn from(user: crate::domain::user::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            bio: user.bio,
            is_staff: user.is_staff,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletionReport {
    pub messages: i64,
    pub notifications: i64,
    pub history_entries: i64,
}

impl From<crate::domain::user::DeletionReport> for DeletionReport {
    fn from(report: crate::domain::user::DeletionReport) -> Self {
        Self {
            messages: report.messages,
            notifications: report.notifications,
            history_entries: report.history_entries,
        }
    }
}

use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct User {
    pub(crate) id: Uuid,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) bio: String,
    pub(crate) is_staff: bool,
    pub(crate) password_hash: String,
    pub(crate) created_at: Option<OffsetDateTime>,
}

/// Counts gathered before an account deletion cascades.
#[derive(Debug, Clone, Copy)]
pub struct DeletionReport {
    pub(crate) messages: i64,
    pub(crate) notifications: i64,
    pub(crate) history_entries: i64,
}

use time::OffsetDateTime;
use uuid::Uuid;

/// What happened to the message a notification points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    NewMessage,
    MessageEdited,
    MessageDeleted,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewMessage => "new_message",
            Self::MessageEdited => "message_edited",
            Self::MessageDeleted => "message_deleted",
        }
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "new_message" => Ok(Self::NewMessage),
            "message_edited" => Ok(Self::MessageEdited),
            "message_deleted" => Ok(Self::MessageDeleted),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub(crate) id: Uuid,
    pub(crate) user_id: Uuid,
    pub(crate) message_id: Option<Uuid>,
    pub(crate) kind: NotificationKind,
    pub(crate) body: String,
    pub(crate) is_read: bool,
    pub(crate) created_at: OffsetDateTime,
}

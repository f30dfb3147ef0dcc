pub mod conversation;
pub mod history;
pub mod message;
pub mod notification;
pub mod user;

pub(crate) use conversation::{Conversation, Participant};
pub(crate) use history::MessageHistory;
pub(crate) use message::Message;
pub(crate) use notification::Notification;
pub(crate) use user::User;

use crate::domain::message::{InboxSummary as DomainSummary, flatten_thread};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EditMessage {
    pub content: String,
    pub edit_reason: Option<String>,
}

/// Query parameters for the conversation message listing, matching the
/// filterable fields of the source system.
#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub sent_after: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub sent_before: Option<OffsetDateTime>,
    pub sender: Option<Uuid>,
    pub is_read: Option<bool>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub is_read: bool,
    pub edited: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_edited_at: Option<OffsetDateTime>,
    pub edit_count: i32,
    pub parent_id: Option<Uuid>,
    pub root_id: Option<Uuid>,
    pub thread_depth: i32,
}

impl From<crate::domain::message::Message> for Message {
    fn from(message: crate::domain::message::Message) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            sender_username: message.sender_username,
            content: message.content,
            created_at: message.created_at,
            is_read: message.is_read,
            edited: message.edited,
            last_edited_at: message.last_edited_at,
            edit_count: message.edit_count,
            parent_id: message.parent_id,
            root_id: message.root_id,
            thread_depth: message.thread_depth,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessagePage {
    pub items: Vec<Message>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ThreadNode {
    pub message: Message,
    pub replies: Vec<ThreadNode>,
}

impl From<crate::domain::message::ThreadNode> for ThreadNode {
    fn from(node: crate::domain::message::ThreadNode) -> Self {
        Self {
            message: node.message.into(),
            replies: node.replies.into_iter().map(Into::into).collect(),
        }
    }
}

/// A thread rendered both ways: flattened in thread order and nested.
#[derive(Debug, Serialize)]
pub struct Thread {
    pub root_id: Uuid,
    pub flat: Vec<Message>,
    pub tree: Vec<ThreadNode>,
}

impl Thread {
    #[must_use]
    pub fn build(root_id: Uuid, nodes: Vec<crate::domain::message::ThreadNode>) -> Self {
        let flat = flatten_thread(&nodes).into_iter().cloned().map(Into::into).collect();
        Self { root_id, flat, tree: nodes.into_iter().map(Into::into).collect() }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub old_content: String,
    pub edited_by: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub edited_at: OffsetDateTime,
    pub edit_reason: String,
}

impl From<crate::domain::history::MessageHistory> for HistoryEntry {
    fn from(entry: crate::domain::history::MessageHistory) -> Self {
        Self {
            id: entry.id,
            old_content: entry.old_content,
            edited_by: entry.edited_by,
            edited_at: entry.edited_at,
            edit_reason: entry.edit_reason,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InboxSummary {
    pub total_unread: i64,
    pub unique_senders: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub oldest_unread: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub newest_unread: Option<OffsetDateTime>,
    pub total_received: i64,
    pub read_received: i64,
    pub total_sent: i64,
}

impl From<DomainSummary> for InboxSummary {
    fn from(summary: DomainSummary) -> Self {
        Self {
            total_unread: summary.total_unread,
            unique_senders: summary.unique_senders,
            oldest_unread: summary.oldest_unread,
            newest_unread: summary.newest_unread,
            total_received: summary.total_received,
            read_received: summary.read_received,
            total_sent: summary.total_sent,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub marked: u64,
}

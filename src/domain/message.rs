use std::collections::{HashMap, HashSet};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) id: Uuid,
    pub(crate) conversation_id: Uuid,
    pub(crate) sender_id: Uuid,
    pub(crate) sender_username: String,
    pub(crate) content: String,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) is_read: bool,
    pub(crate) edited: bool,
    pub(crate) last_edited_at: Option<OffsetDateTime>,
    pub(crate) edit_count: i32,
    pub(crate) parent_id: Option<Uuid>,
    pub(crate) root_id: Option<Uuid>,
    pub(crate) thread_depth: i32,
}

impl Message {
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The id of the thread this message belongs to. Root messages carry a
    /// NULL `root_id` and are their own root.
    #[must_use]
    pub fn thread_root(&self) -> Uuid {
        self.root_id.unwrap_or(self.id)
    }
}

/// Aggregated read/unread counts for one user's inbox.
#[derive(Debug, Clone, Copy)]
pub struct InboxSummary {
    pub(crate) total_unread: i64,
    pub(crate) unique_senders: i64,
    pub(crate) oldest_unread: Option<OffsetDateTime>,
    pub(crate) newest_unread: Option<OffsetDateTime>,
    pub(crate) total_received: i64,
    pub(crate) read_received: i64,
    pub(crate) total_sent: i64,
}

/// One message and its direct replies, recursively.
#[derive(Debug)]
pub struct ThreadNode {
    pub(crate) message: Message,
    pub(crate) replies: Vec<ThreadNode>,
}

/// Builds a reply tree from a flat slice of thread messages.
///
/// Messages whose parent is absent from the input (or who have none) become
/// roots. Sibling order follows input order, so callers should pass rows
/// sorted by `(thread_depth, created_at)` to get chronological nesting.
#[must_use]
pub fn build_thread_tree(messages: Vec<Message>) -> Vec<ThreadNode> {
    let ids: HashSet<Uuid> = messages.iter().map(|m| m.id).collect();

    let mut children: HashMap<Uuid, Vec<Message>> = HashMap::new();
    let mut roots: Vec<Message> = Vec::new();
    for msg in messages {
        match msg.parent_id {
            Some(parent_id) if ids.contains(&parent_id) => {
                children.entry(parent_id).or_default().push(msg);
            }
            _ => roots.push(msg),
        }
    }

    fn attach(message: Message, children: &mut HashMap<Uuid, Vec<Message>>) -> ThreadNode {
        let replies = children
            .remove(&message.id)
            .unwrap_or_default()
            .into_iter()
            .map(|child| attach(child, children))
            .collect();
        ThreadNode { message, replies }
    }

    roots.into_iter().map(|root| attach(root, &mut children)).collect()
}

/// Flattens a tree back into thread order (each message before its replies).
#[must_use]
pub fn flatten_thread(nodes: &[ThreadNode]) -> Vec<&Message> {
    let mut out = Vec::new();
    let mut stack: Vec<&ThreadNode> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(&node.message);
        stack.extend(node.replies.iter().rev());
    }
    out
}

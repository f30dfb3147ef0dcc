use crate::config::MessagingConfig;
use crate::domain::history::MessageHistory;
use crate::domain::message::{InboxSummary, Message, ThreadNode, build_thread_tree};
use crate::domain::notification::NotificationKind;
use crate::error::{AppError, Result};
use crate::storage::DbPool;
use crate::storage::cache::QueryCache;
use crate::storage::conversation_repo::ConversationRepository;
use crate::storage::history_repo::HistoryRepository;
use crate::storage::message_repo::{MessageFilters, MessageRepository};
use crate::storage::notification_repo::NotificationRepository;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use sqlx::{Connection, PgConnection};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub(crate) struct Metrics {
    pub(crate) sent_total: Counter<u64>,
    pub(crate) edited_total: Counter<u64>,
    pub(crate) deleted_total: Counter<u64>,
    pub(crate) inbox_page_size: Histogram<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("threadline-server");
        Self {
            sent_total: meter
                .u64_counter("threadline_messages_sent_total")
                .with_description("Total messages stored")
                .build(),
            edited_total: meter
                .u64_counter("threadline_messages_edited_total")
                .with_description("Total message edits applied")
                .build(),
            deleted_total: meter
                .u64_counter("threadline_messages_deleted_total")
                .with_description("Total messages deleted")
                .build(),
            inbox_page_size: meter
                .u64_histogram("threadline_inbox_page_size")
                .with_description("Number of messages returned per unread inbox page")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MessageService {
    pool: DbPool,
    repo: MessageRepository,
    history_repo: HistoryRepository,
    notification_repo: NotificationRepository,
    conversation_repo: ConversationRepository,
    summary_cache: Arc<QueryCache<Uuid, InboxSummary>>,
    config: MessagingConfig,
    metrics: Metrics,
}

impl MessageService {
    #[must_use]
    pub fn new(
        pool: DbPool,
        repo: MessageRepository,
        history_repo: HistoryRepository,
        notification_repo: NotificationRepository,
        conversation_repo: ConversationRepository,
        config: MessagingConfig,
    ) -> Self {
        let summary_cache = Arc::new(QueryCache::new(StdDuration::from_secs(config.summary_cache_ttl_secs)));
        Self {
            pool,
            repo,
            history_repo,
            notification_repo,
            conversation_repo,
            summary_cache,
            config,
            metrics: Metrics::new(),
        }
    }

    /// Clamps a client-requested page size into the configured bounds.
    #[must_use]
    pub fn page_limit(&self, requested: Option<i64>) -> i64 {
        requested.unwrap_or(self.config.page_size).clamp(1, self.config.max_page_size)
    }

    /// Stores a message in a conversation, deriving threading fields when it
    /// is a reply, and fans out one `new_message` notification per other
    /// participant.
    ///
    /// # Errors
    /// Returns `AppError::Forbidden` if the sender is not a participant and
    /// `AppError::BadRequest` for an empty body or a parent from another
    /// conversation.
    #[tracing::instrument(
        skip(self, content),
        fields(conversation_id = %conversation_id, sender_id = %sender_id),
        err(level = "warn")
    )]
    pub async fn send_message(
        &self,
        sender_id: Uuid,
        conversation_id: Uuid,
        content: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest("Message content is required".to_string()));
        }

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        self.require_participant(&mut tx, conversation_id, sender_id).await?;

        let parent = match parent_id {
            Some(id) => {
                let parent = self
                    .repo
                    .find_by_id(&mut tx, id)
                    .await?
                    .ok_or_else(|| AppError::BadRequest("Parent message does not exist".to_string()))?;
                if parent.conversation_id != conversation_id {
                    return Err(AppError::BadRequest("Parent message belongs to another conversation".to_string()));
                }
                Some(parent)
            }
            None => None,
        };

        let message = self.repo.create(&mut tx, conversation_id, sender_id, content, parent.as_ref()).await?;
        self.conversation_repo.touch(&mut tx, conversation_id).await?;

        let body = format!("You have a new message from {}", message.sender_username);
        let recipients = self.notify_participants(&mut tx, &message, NotificationKind::NewMessage, &body).await?;

        tx.commit().await?;

        tracing::debug!(message_id = %message.id, "Message stored");
        self.metrics.sent_total.add(1, &[KeyValue::new("status", "success")]);
        self.invalidate_summaries(sender_id, &recipients);

        Ok(message)
    }

    /// Replaces a message's content, snapshotting the old content into the
    /// edit history first and notifying the other participants.
    ///
    /// The guards mirror who-may-edit policy: only the sender, only within
    /// the edit window, only up to the edit cap, and only when the content
    /// actually changed.
    #[tracing::instrument(skip(self, new_content, edit_reason), fields(message_id = %message_id), err(level = "warn"))]
    pub async fn edit_message(
        &self,
        actor_id: Uuid,
        message_id: Uuid,
        new_content: &str,
        edit_reason: Option<&str>,
    ) -> Result<Message> {
        if new_content.trim().is_empty() {
            return Err(AppError::BadRequest("Message content cannot be empty".to_string()));
        }

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let message = self.repo.lock_by_id(&mut tx, message_id).await?.ok_or(AppError::NotFound)?;

        if message.sender_id != actor_id {
            return Err(AppError::Forbidden("Only the sender may edit a message".to_string()));
        }
        let age = OffsetDateTime::now_utc() - message.created_at;
        if age > Duration::hours(self.config.edit_window_hours) {
            return Err(AppError::Forbidden(format!(
                "Messages may only be edited within {} hours",
                self.config.edit_window_hours
            )));
        }
        if message.edit_count >= self.config.max_edits {
            return Err(AppError::Forbidden(format!("Messages may be edited at most {} times", self.config.max_edits)));
        }
        if message.content == new_content {
            return Err(AppError::BadRequest("No changes detected in message content".to_string()));
        }

        self.history_repo.create(&mut tx, message_id, &message.content, actor_id, edit_reason.unwrap_or("")).await?;
        self.repo.apply_edit(&mut tx, message_id, new_content).await?;

        let updated = self.repo.find_by_id(&mut tx, message_id).await?.ok_or(AppError::Internal)?;

        let body = format!("{} edited a message they sent to you", updated.sender_username);
        let recipients = self.notify_participants(&mut tx, &updated, NotificationKind::MessageEdited, &body).await?;

        tx.commit().await?;

        tracing::info!(edit_count = updated.edit_count, "Message edited");
        self.metrics.edited_total.add(1, &[]);
        self.invalidate_summaries(actor_id, &recipients);

        Ok(updated)
    }

    /// Deletes a message (sender or staff), leaving `message_deleted`
    /// notifications behind for the other participants. Replies go with it
    /// via the parent cascade.
    #[tracing::instrument(skip(self), fields(message_id = %message_id), err(level = "warn"))]
    pub async fn delete_message(&self, actor_id: Uuid, actor_is_staff: bool, message_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let message = self.repo.find_by_id(&mut tx, message_id).await?.ok_or(AppError::NotFound)?;
        if message.sender_id != actor_id && !actor_is_staff {
            return Err(AppError::Forbidden("Only the sender or staff may delete a message".to_string()));
        }

        let body = format!("{} deleted a message", message.sender_username);
        let recipients = self.notify_participants(&mut tx, &message, NotificationKind::MessageDeleted, &body).await?;

        self.repo.delete(&mut tx, message_id).await?;
        tx.commit().await?;

        tracing::info!("Message deleted");
        self.metrics.deleted_total.add(1, &[]);
        self.invalidate_summaries(actor_id, &recipients);

        Ok(())
    }

    pub async fn list_messages(
        &self,
        viewer_id: Uuid,
        conversation_id: Uuid,
        filters: &MessageFilters,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Message>> {
        let mut conn = self.pool.acquire().await?;
        self.require_participant(&mut conn, conversation_id, viewer_id).await?;
        self.repo.list_for_conversation(&mut conn, conversation_id, filters, cursor, limit).await
    }

    /// The full reply tree around a message, rooted at its thread root.
    pub async fn thread(&self, viewer_id: Uuid, message_id: Uuid) -> Result<Vec<ThreadNode>> {
        let mut conn = self.pool.acquire().await?;
        let message = self.repo.find_by_id(&mut conn, message_id).await?.ok_or(AppError::NotFound)?;
        self.require_participant(&mut conn, message.conversation_id, viewer_id).await?;

        let messages = self.repo.thread_messages(&mut conn, message.thread_root()).await?;
        Ok(build_thread_tree(messages))
    }

    /// Edit history for a message, visible to its sender and staff.
    pub async fn history(&self, viewer_id: Uuid, viewer_is_staff: bool, message_id: Uuid) -> Result<Vec<MessageHistory>> {
        let mut conn = self.pool.acquire().await?;
        let message = self.repo.find_by_id(&mut conn, message_id).await?.ok_or(AppError::NotFound)?;
        if message.sender_id != viewer_id && !viewer_is_staff {
            return Err(AppError::Forbidden("Only the sender or staff may view edit history".to_string()));
        }
        self.history_repo.list_for_message(&mut conn, message_id).await
    }

    /// Marks a single message read. Participants other than the sender only.
    #[tracing::instrument(skip(self), fields(message_id = %message_id), err(level = "warn"))]
    pub async fn mark_read(&self, actor_id: Uuid, message_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let message = self.repo.find_by_id(&mut conn, message_id).await?.ok_or(AppError::NotFound)?;
        self.require_participant(&mut conn, message.conversation_id, actor_id).await?;
        if message.sender_id == actor_id {
            return Err(AppError::BadRequest("Cannot mark your own message as read".to_string()));
        }

        self.repo.mark_read(&mut conn, message_id).await?;
        self.summary_cache.invalidate(&actor_id);
        Ok(())
    }

    /// Marks every unread message in a conversation read for the caller.
    pub async fn mark_conversation_read(&self, actor_id: Uuid, conversation_id: Uuid) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        self.require_participant(&mut conn, conversation_id, actor_id).await?;

        let marked = self.repo.mark_conversation_read(&mut conn, conversation_id, actor_id).await?;
        self.summary_cache.invalidate(&actor_id);
        Ok(marked)
    }

    /// A page of the caller's cross-conversation unread inbox.
    pub async fn unread_inbox(
        &self,
        viewer_id: Uuid,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Message>> {
        let mut conn = self.pool.acquire().await?;
        let messages = self.repo.unread_page(&mut conn, viewer_id, cursor, limit).await?;
        self.metrics.inbox_page_size.record(messages.len() as u64, &[]);
        Ok(messages)
    }

    /// Inbox summary, served from the TTL cache when fresh. On a miss the
    /// unread aggregate and the received stats run concurrently on separate
    /// connections.
    #[tracing::instrument(skip(self), fields(user_id = %viewer_id), err)]
    pub async fn inbox_summary(&self, viewer_id: Uuid) -> Result<InboxSummary> {
        if let Some(summary) = self.summary_cache.get(&viewer_id) {
            tracing::debug!("Inbox summary served from cache");
            return Ok(summary);
        }

        let mut unread_conn = self.pool.acquire().await?;
        let mut stats_conn = self.pool.acquire().await?;

        let (unread, received) = tokio::try_join!(
            self.repo.unread_aggregate(&mut unread_conn, viewer_id),
            self.repo.received_stats(&mut stats_conn, viewer_id),
        )?;
        let total_sent = self.repo.sent_count(&mut unread_conn, viewer_id).await?;

        let summary = InboxSummary {
            total_unread: unread.total_unread,
            unique_senders: unread.unique_senders,
            oldest_unread: unread.oldest_unread,
            newest_unread: unread.newest_unread,
            total_received: received.total_received,
            read_received: received.read_received,
            total_sent,
        };

        self.summary_cache.insert(viewer_id, summary);
        Ok(summary)
    }

    async fn require_participant(&self, conn: &mut PgConnection, conversation_id: Uuid, user_id: Uuid) -> Result<()> {
        if self.conversation_repo.find_by_id(conn, conversation_id).await?.is_none() {
            return Err(AppError::NotFound);
        }
        if !self.conversation_repo.is_participant(conn, conversation_id, user_id).await? {
            return Err(AppError::Forbidden("Not a participant of this conversation".to_string()));
        }
        Ok(())
    }

    /// Inserts one notification per participant other than the sender and
    /// returns the recipients.
    async fn notify_participants(
        &self,
        conn: &mut PgConnection,
        message: &Message,
        kind: NotificationKind,
        body: &str,
    ) -> Result<Vec<Uuid>> {
        let participants = self.conversation_repo.participant_ids(conn, message.conversation_id).await?;
        let recipients: Vec<Uuid> = participants.into_iter().filter(|id| *id != message.sender_id).collect();

        for recipient in &recipients {
            self.notification_repo.create(conn, *recipient, message.id, kind, body).await?;
        }

        tracing::debug!(kind = kind.as_str(), count = recipients.len(), "Notifications fanned out");
        Ok(recipients)
    }

    fn invalidate_summaries(&self, actor_id: Uuid, recipients: &[Uuid]) {
        self.summary_cache.invalidate(&actor_id);
        for recipient in recipients {
            self.summary_cache.invalidate(recipient);
        }
    }
}

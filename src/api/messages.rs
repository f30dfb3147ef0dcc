use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::messaging::{
    EditMessage, HistoryEntry, InboxQuery, InboxSummary, ListMessagesQuery, MarkedRead, Message, MessagePage,
    SendMessage, Thread,
};
use crate::api::schemas::{encode_cursor, parse_cursor};
use crate::error::Result;
use crate::storage::message_repo::MessageFilters;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// Sends a message to a conversation; `parent_id` makes it a reply.
pub async fn send(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<SendMessage>,
) -> Result<impl IntoResponse> {
    let message = state
        .message_service
        .send_message(auth_user.user_id, conversation_id, &payload.content, payload.parent_id)
        .await?;

    Ok((StatusCode::CREATED, Json(Message::from(message))))
}

/// Lists a conversation's messages, newest first, with optional filters.
pub async fn list(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<ListMessagesQuery>,
) -> Result<impl IntoResponse> {
    let cursor = parse_cursor(query.cursor.as_deref())?;
    let limit = state.message_service.page_limit(query.limit);

    let filters = MessageFilters {
        sent_after: query.sent_after,
        sent_before: query.sent_before,
        sender_id: query.sender,
        is_read: query.is_read,
        content_query: query.q,
    };

    let messages =
        state.message_service.list_messages(auth_user.user_id, conversation_id, &filters, cursor, limit).await?;

    Ok(Json(page(messages, limit)))
}

pub async fn edit(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Json(payload): Json<EditMessage>,
) -> Result<impl IntoResponse> {
    let message = state
        .message_service
        .edit_message(auth_user.user_id, message_id, &payload.content, payload.edit_reason.as_deref())
        .await?;

    Ok(Json(Message::from(message)))
}

pub async fn delete(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let is_staff = state.account_service.profile(auth_user.user_id).await?.is_staff;
    state.message_service.delete_message(auth_user.user_id, is_staff, message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The reply tree around a message, rooted at its thread root.
pub async fn thread(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let nodes = state.message_service.thread(auth_user.user_id, message_id).await?;
    let root_id = nodes.first().map_or(message_id, |node| node.message.id);
    Ok(Json(Thread::build(root_id, nodes)))
}

/// Edit history for a message, newest first.
pub async fn history(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let is_staff = state.account_service.profile(auth_user.user_id).await?.is_staff;
    let entries = state.message_service.history(auth_user.user_id, is_staff, message_id).await?;

    let entries: Vec<HistoryEntry> = entries.into_iter().map(Into::into).collect();
    Ok(Json(entries))
}

pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.message_service.mark_read(auth_user.user_id, message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_conversation_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let marked = state.message_service.mark_conversation_read(auth_user.user_id, conversation_id).await?;
    Ok(Json(MarkedRead { marked }))
}

/// The caller's unread inbox across all conversations.
pub async fn inbox(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<InboxQuery>,
) -> Result<impl IntoResponse> {
    let cursor = parse_cursor(query.cursor.as_deref())?;
    let limit = state.message_service.page_limit(query.limit);

    let messages = state.message_service.unread_inbox(auth_user.user_id, cursor, limit).await?;
    Ok(Json(page(messages, limit)))
}

pub async fn inbox_summary(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let summary = state.message_service.inbox_summary(auth_user.user_id).await?;
    Ok(Json(InboxSummary::from(summary)))
}

fn page(messages: Vec<crate::domain::message::Message>, limit: i64) -> MessagePage {
    let next_cursor = (messages.len() as i64 == limit)
        .then(|| messages.last().map(|m| encode_cursor(m.created_at, m.id)))
        .flatten();

    MessagePage { items: messages.into_iter().map(Message::from).collect(), next_cursor }
}

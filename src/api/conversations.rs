use crate::api::AppState;
use crate::api::middleware::{AuthUser, StaffUser};
use crate::api::schemas::conversations::{
    AddParticipant, Conversation, ConversationDetail, ConversationPage, CreateConversation, ListQuery, Participant,
};
use crate::api::schemas::{encode_cursor, parse_cursor};
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn create(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateConversation>,
) -> Result<impl IntoResponse> {
    let conversation = state.conversation_service.create(auth_user.user_id, payload.title).await?;
    Ok((StatusCode::CREATED, Json(Conversation::from(conversation))))
}

/// Lists the caller's conversations, most recently active first.
pub async fn list(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let cursor = parse_cursor(query.cursor.as_deref())?;
    let limit = state.message_service.page_limit(query.limit);

    let conversations = state.conversation_service.list_for_user(auth_user.user_id, cursor, limit).await?;

    let next_cursor = (conversations.len() as i64 == limit)
        .then(|| conversations.last().map(|c| encode_cursor(c.updated_at, c.id)))
        .flatten();

    let items = conversations.into_iter().map(Conversation::from).collect();
    Ok(Json(ConversationPage { items, next_cursor }))
}

pub async fn get(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (conversation, participants) = state.conversation_service.get(conversation_id, auth_user.user_id).await?;

    Ok(Json(ConversationDetail {
        conversation: conversation.into(),
        participants: participants.into_iter().map(Participant::from).collect(),
    }))
}

pub async fn add_participant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<AddParticipant>,
) -> Result<impl IntoResponse> {
    state.conversation_service.add_participant(conversation_id, auth_user.user_id, payload.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_participant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((conversation_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let is_staff = state.account_service.profile(auth_user.user_id).await?.is_staff;
    state.conversation_service.remove_participant(conversation_id, auth_user.user_id, is_staff, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a conversation and everything in it. Staff only.
pub async fn delete(
    _staff: StaffUser,
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.conversation_service.delete(conversation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

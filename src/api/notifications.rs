use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::notifications::{ListQuery, MarkedRead, Notification, NotificationPage};
use crate::api::schemas::{encode_cursor, parse_cursor};
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

pub async fn list(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let cursor = parse_cursor(query.cursor.as_deref())?;
    let limit = state.message_service.page_limit(query.limit);

    let (notifications, unread_count) = tokio::try_join!(
        state.notification_service.list(auth_user.user_id, query.unread, cursor, limit),
        state.notification_service.unread_count(auth_user.user_id),
    )?;

    let next_cursor = (notifications.len() as i64 == limit)
        .then(|| notifications.last().map(|n| encode_cursor(n.created_at, n.id)))
        .flatten();

    Ok(Json(NotificationPage {
        items: notifications.into_iter().map(Notification::from).collect(),
        next_cursor,
        unread_count,
    }))
}

pub async fn mark_read(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.notification_service.mark_read(auth_user.user_id, notification_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let marked = state.notification_service.mark_all_read(auth_user.user_id).await?;
    Ok(Json(MarkedRead { marked }))
}

use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::users::{DeletionReport, Profile};
use crate::error::Result;
use axum::{Json, extract::State, response::IntoResponse};

pub async fn me(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let profile = state.account_service.profile(auth_user.user_id).await?;
    Ok(Json(Profile::from(profile)))
}

/// Deletes the caller's account; dependent rows go with it via FK cascade.
pub async fn delete_me(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let report = state.account_service.delete_account(auth_user.user_id).await?;
    Ok(Json(DeletionReport::from(report)))
}

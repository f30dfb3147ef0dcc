use crate::api::AppState;
use crate::domain::auth::Jwt;
use crate::error::AppError;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// The authenticated caller, extracted from the bearer token.
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts.headers.get(header::AUTHORIZATION).ok_or(AppError::AuthError)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::AuthError)?;
        let token = auth_str.strip_prefix("Bearer ").ok_or(AppError::AuthError)?;

        let user_id = state.auth_service.verify_token(&Jwt(token.to_string()))?;
        tracing::Span::current().record("user_id", tracing::field::display(user_id));

        Ok(Self { user_id })
    }
}

/// Like `AuthUser`, but the account must carry the staff flag. Guards the
/// admin-only routes.
#[derive(Debug)]
pub struct StaffUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;

        let profile = state.account_service.profile(auth_user.user_id).await.map_err(|_| AppError::AuthError)?;
        if !profile.is_staff {
            return Err(AppError::Forbidden("Staff privileges required for this action".to_string()));
        }

        Ok(Self { user_id: auth_user.user_id })
    }
}

/// Reuses an inbound `x-request-id` header, minting a UUID when absent.
#[derive(Clone, Copy, Debug)]
pub struct MakeRequestUuidOrHeader;

impl MakeRequestId for MakeRequestUuidOrHeader {
    fn make_request_id<B>(&mut self, request: &axum::http::Request<B>) -> Option<RequestId> {
        if let Some(id) = request.headers().get("x-request-id") {
            return Some(RequestId::new(id.clone()));
        }
        HeaderValue::from_str(&Uuid::new_v4().to_string()).ok().map(RequestId::new)
    }
}

/// Whether the given UTC hour falls inside the accepting window. The window
/// may wrap midnight.
#[must_use]
pub(crate) const fn is_open_hour(hour: u8, open: u8, close: u8) -> bool {
    if open <= close { hour >= open && hour < close } else { hour >= open || hour < close }
}

/// Rejects requests outside the configured open hours when enforcement is on.
pub async fn enforce_quiet_hours(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let server = &state.config.server;
    if server.quiet_hours_enabled {
        let hour = time::OffsetDateTime::now_utc().hour();
        if !is_open_hour(hour, server.open_hour, server.close_hour) {
            tracing::debug!(hour, "Request rejected during quiet hours");
            return AppError::Forbidden(format!(
                "Service is unavailable between {}:00 and {}:00 UTC",
                server.close_hour, server.open_hour
            ))
            .into_response();
        }
    }

    next.run(request).await
}

/// Records rate limiter decisions after the governor layers have run.
pub async fn log_rate_limit_events(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let ratelimit_after =
        response.headers().get("x-ratelimit-after").and_then(|v| v.to_str().ok()).map(ToString::to_string);
    state.rate_limit_service.log_decision(response.status(), ratelimit_after);

    response
}

use crate::api::middleware::{enforce_quiet_hours, log_rate_limit_events};
use crate::config::Config;
use crate::services::account_service::AccountService;
use crate::services::auth_service::AuthService;
use crate::services::conversation_service::ConversationService;
use crate::services::health_service::HealthService;
use crate::services::message_service::MessageService;
use crate::services::notification_service::NotificationService;
use crate::services::rate_limit_service::RateLimitService;
use crate::storage::DbPool;
use crate::storage::conversation_repo::ConversationRepository;
use crate::storage::history_repo::HistoryRepository;
use crate::storage::message_repo::MessageRepository;
use crate::storage::notification_repo::NotificationRepository;
use crate::storage::refresh_token_repo::RefreshTokenRepository;
use crate::storage::user_repo::UserRepository;
use axum::body::Body;
use axum::http::Request;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod conversations;
pub mod health;
pub mod messages;
pub mod middleware;
pub mod notifications;
pub mod schemas;
pub mod users;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub account_service: AccountService,
    pub auth_service: AuthService,
    pub conversation_service: ConversationService,
    pub message_service: MessageService,
    pub notification_service: NotificationService,
    pub rate_limit_service: RateLimitService,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub pool: DbPool,
    pub account_service: AccountService,
    pub auth_service: AuthService,
    pub conversation_service: ConversationService,
    pub message_service: MessageService,
    pub notification_service: NotificationService,
    pub rate_limit_service: RateLimitService,
}

impl ServiceContainer {
    /// Wires every service against one pool. Repositories are stateless, so
    /// each service gets its own copies.
    #[must_use]
    pub fn build(config: &Config, pool: DbPool) -> Self {
        let auth_service =
            AuthService::new(config.auth.clone(), pool.clone(), UserRepository::new(), RefreshTokenRepository::new());
        let account_service = AccountService::new(
            pool.clone(),
            UserRepository::new(),
            MessageRepository::new(),
            NotificationRepository::new(),
            HistoryRepository::new(),
            auth_service.clone(),
        );
        let conversation_service =
            ConversationService::new(pool.clone(), ConversationRepository::new(), UserRepository::new());
        let message_service = MessageService::new(
            pool.clone(),
            MessageRepository::new(),
            HistoryRepository::new(),
            NotificationRepository::new(),
            ConversationRepository::new(),
            config.messaging.clone(),
        );
        let notification_service = NotificationService::new(pool.clone(), NotificationRepository::new());
        let rate_limit_service = RateLimitService::new(config.server.trusted_proxies.clone());

        Self {
            pool,
            account_service,
            auth_service,
            conversation_service,
            message_service,
            notification_service,
            rate_limit_service,
        }
    }
}

/// Configures and returns the primary application router.
///
/// # Panics
/// Panics if the rate limiter configuration cannot be constructed.
pub fn app_router(config: Config, services: ServiceContainer) -> Router {
    let std_interval_ns = 1_000_000_000 / config.rate_limit.per_second.max(1);
    let standard_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(std_interval_ns))
            .burst_size(config.rate_limit.burst)
            .key_extractor(services.rate_limit_service.extractor.clone())
            .finish()
            .expect("Failed to build standard rate limiter config"),
    );

    // Auth tier: stricter limits for expensive/sensitive registration & login
    let auth_interval_ns = 1_000_000_000 / config.rate_limit.auth_per_second.max(1);
    let auth_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(auth_interval_ns))
            .burst_size(config.rate_limit.auth_burst)
            .key_extractor(services.rate_limit_service.extractor.clone())
            .finish()
            .expect("Failed to build auth rate limiter config"),
    );

    // Send tier: caps how many messages one client IP may post per minute
    let send_interval_ns = 60_000_000_000 / u64::from(config.rate_limit.send_per_minute.max(1));
    let send_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(send_interval_ns)
            .burst_size(config.rate_limit.send_burst)
            .key_extractor(services.rate_limit_service.extractor.clone())
            .finish()
            .expect("Failed to build send rate limiter config"),
    );

    let state = AppState {
        config,
        account_service: services.account_service,
        auth_service: services.auth_service,
        conversation_service: services.conversation_service,
        message_service: services.message_service,
        notification_service: services.notification_service,
        rate_limit_service: services.rate_limit_service,
    };

    // Sensitive routes with strict limits
    let auth_routes = Router::new()
        .route("/users", post(auth::register))
        .route("/sessions", post(auth::login))
        .route("/sessions", delete(auth::logout))
        .route("/sessions/refresh", post(auth::refresh))
        .layer(GovernorLayer::new(auth_conf));

    // Standard routes. Message posting additionally rides its own governor,
    // applied to the POST method router only.
    let api_routes = Router::new()
        .route("/users/me", get(users::me))
        .route("/users/me", delete(users::delete_me))
        .route("/conversations", post(conversations::create))
        .route("/conversations", get(conversations::list))
        .route("/conversations/{conversationId}", get(conversations::get))
        .route("/conversations/{conversationId}", delete(conversations::delete))
        .route("/conversations/{conversationId}/participants", post(conversations::add_participant))
        .route("/conversations/{conversationId}/participants/{userId}", delete(conversations::remove_participant))
        .route(
            "/conversations/{conversationId}/messages",
            post(messages::send).layer(GovernorLayer::new(send_conf)).get(messages::list),
        )
        .route("/conversations/{conversationId}/read", post(messages::mark_conversation_read))
        .route("/messages/{messageId}", patch(messages::edit))
        .route("/messages/{messageId}", delete(messages::delete))
        .route("/messages/{messageId}/thread", get(messages::thread))
        .route("/messages/{messageId}/history", get(messages::history))
        .route("/messages/{messageId}/read", post(messages::mark_read))
        .route("/inbox/unread", get(messages::inbox))
        .route("/inbox/summary", get(messages::inbox_summary))
        .route("/notifications", get(notifications::list))
        .route("/notifications/{notificationId}/read", post(notifications::mark_read))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .layer(GovernorLayer::new(standard_conf));

    Router::new()
        .nest("/v1", auth_routes.merge(api_routes))
        .layer(from_fn_with_state(state.clone(), log_rate_limit_events))
        .layer(from_fn_with_state(state.clone(), enforce_quiet_hours))
        .layer(PropagateRequestIdLayer::new(axum::http::HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                        "user_id" = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                        let status = response.status();
                        tracing::Span::current().record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(
            axum::http::HeaderName::from_static("x-request-id"),
            middleware::MakeRequestUuidOrHeader,
        ))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}

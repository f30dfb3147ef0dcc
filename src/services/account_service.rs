use crate::domain::auth_session::AuthSession;
use crate::domain::user::{DeletionReport, User};
use crate::error::{AppError, Result};
use crate::services::auth_service::AuthService;
use crate::storage::DbPool;
use crate::storage::history_repo::HistoryRepository;
use crate::storage::message_repo::MessageRepository;
use crate::storage::notification_repo::NotificationRepository;
use crate::storage::user_repo::UserRepository;
use opentelemetry::{global, metrics::Counter};
use sqlx::Connection;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 32;

#[derive(Clone, Debug)]
struct Metrics {
    registered_total: Counter<u64>,
    deleted_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("threadline-server");
        Self {
            registered_total: meter
                .u64_counter("accounts_registered_total")
                .with_description("Total number of accounts created")
                .build(),
            deleted_total: meter
                .u64_counter("accounts_deleted_total")
                .with_description("Total number of accounts deleted")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AccountService {
    pool: DbPool,
    user_repo: UserRepository,
    message_repo: MessageRepository,
    notification_repo: NotificationRepository,
    history_repo: HistoryRepository,
    auth_service: AuthService,
    metrics: Metrics,
}

impl AccountService {
    #[must_use]
    pub fn new(
        pool: DbPool,
        user_repo: UserRepository,
        message_repo: MessageRepository,
        notification_repo: NotificationRepository,
        history_repo: HistoryRepository,
        auth_service: AuthService,
    ) -> Self {
        Self { pool, user_repo, message_repo, notification_repo, history_repo, auth_service, metrics: Metrics::new() }
    }

    /// Creates an account and opens a session for it.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` for malformed credentials and
    /// `AppError::Conflict` when the username or email is taken.
    #[tracing::instrument(skip(self, username, email, password), err(level = "warn"))]
    pub async fn register(&self, username: String, email: String, password: String) -> Result<AuthSession> {
        validate_username(&username)?;
        validate_email(&email)?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!("Password must be at least {MIN_PASSWORD_LEN} characters")));
        }

        let mut conn = self.pool.acquire().await?;
        if self.user_repo.username_or_email_taken(&mut conn, &username, &email).await? {
            return Err(AppError::Conflict("Username or email already registered".to_string()));
        }

        let password_hash = self.auth_service.hash_password(&password).await?;
        let user = self.user_repo.create(&mut conn, &username, &email, &password_hash).await?;

        tracing::info!(user_id = %user.id, "Account created");
        self.metrics.registered_total.add(1, &[]);

        self.auth_service.create_session(&mut conn, user.id).await
    }

    /// Fetches a user's own profile.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the account no longer exists.
    pub async fn profile(&self, user_id: Uuid) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        self.user_repo.find_by_id(&mut conn, user_id).await?.ok_or(AppError::NotFound)
    }

    /// Deletes an account. Related messages, notifications, history entries,
    /// participations and refresh tokens go with it via FK cascade; the
    /// returned report holds the counts gathered just before the delete.
    #[tracing::instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn delete_account(&self, user_id: Uuid) -> Result<DeletionReport> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let messages = self.message_repo.sent_count(&mut tx, user_id).await?;
        let notifications = self.notification_repo.count_for_user(&mut tx, user_id).await?;
        let history_entries = self.history_repo.count_for_user(&mut tx, user_id).await?;

        let deleted = self.user_repo.delete(&mut tx, user_id).await?;
        if deleted == 0 {
            return Err(AppError::NotFound);
        }

        tx.commit().await?;

        tracing::info!(messages, notifications, history_entries, "Account deleted");
        self.metrics.deleted_total.add(1, &[]);

        Ok(DeletionReport { messages, notifications, history_entries })
    }
}

fn validate_username(username: &str) -> Result<()> {
    if username.len() < 3 || username.len() > MAX_USERNAME_LEN {
        return Err(AppError::BadRequest(format!("Username must be 3 to {MAX_USERNAME_LEN} characters")));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::BadRequest("Username may only contain letters, digits and underscores".to_string()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let valid = email.split_once('@').is_some_and(|(local, host)| !local.is_empty() && host.contains('.'));
    if valid { Ok(()) } else { Err(AppError::BadRequest("Invalid email address".to_string())) }
}

use crate::domain::notification::Notification;
use crate::error::{AppError, Result};
use crate::storage::DbPool;
use crate::storage::notification_repo::NotificationRepository;
use opentelemetry::{KeyValue, global, metrics::Counter};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Metrics {
    read_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("threadline-server");
        Self {
            read_total: meter
                .u64_counter("threadline_notifications_read_total")
                .with_description("Total notifications marked read")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct NotificationService {
    pool: DbPool,
    repo: NotificationRepository,
    metrics: Metrics,
}

impl NotificationService {
    #[must_use]
    pub fn new(pool: DbPool, repo: NotificationRepository) -> Self {
        Self { pool, repo, metrics: Metrics::new() }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        cursor: Option<(OffsetDateTime, Uuid)>,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        let mut conn = self.pool.acquire().await?;
        self.repo.list_for_user(&mut conn, user_id, unread_only, cursor, limit).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        self.repo.unread_count(&mut conn, user_id).await
    }

    /// Marks one of the caller's notifications read.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the notification does not exist or
    /// belongs to someone else.
    #[tracing::instrument(skip(self), fields(notification_id = %notification_id), err(level = "warn"))]
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let updated = self.repo.mark_read(&mut conn, notification_id, user_id).await?;
        if updated == 0 {
            return Err(AppError::NotFound);
        }
        self.metrics.read_total.add(1, &[KeyValue::new("scope", "single")]);
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        let updated = self.repo.mark_all_read(&mut conn, user_id).await?;
        self.metrics.read_total.add(updated, &[KeyValue::new("scope", "all")]);
        Ok(updated)
    }
}

use crate::config::NotificationConfig;
use crate::services::push::{PushError, PushPayload, PushProvider};
use crate::storage::DbPool;
use crate::storage::notification_repo::NotificationRepository;
use backon::{ExponentialBuilder, Retryable};
use opentelemetry::{KeyValue, global, metrics::Counter};
use sqlx::Connection;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

#[derive(Clone, Debug)]
struct Metrics {
    sent: Counter<u64>,
    errors: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("threadline-server");
        Self {
            sent: meter
                .u64_counter("push_sent_total")
                .with_description("Total number of notifications successfully pushed")
                .build(),
            errors: meter
                .u64_counter("push_errors_total")
                .with_description("Total number of notification push delivery errors")
                .build(),
        }
    }
}

/// Ships undelivered notification rows to the configured webhook.
#[derive(Debug)]
pub struct NotificationDispatchWorker {
    pool: DbPool,
    repo: NotificationRepository,
    provider: Arc<dyn PushProvider>,
    config: NotificationConfig,
    metrics: Metrics,
}

impl NotificationDispatchWorker {
    #[must_use]
    pub fn new(
        pool: DbPool,
        repo: NotificationRepository,
        provider: Arc<dyn PushProvider>,
        config: NotificationConfig,
    ) -> Self {
        Self { pool, repo, provider, config, metrics: Metrics::new() }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.dispatch_interval_secs));

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.process_batch()
                        .instrument(tracing::debug_span!("notification_dispatch_iteration"))
                        .await
                    {
                        tracing::error!(error = ?e, "Notification dispatch iteration failed");
                    }
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Notification dispatch worker shutting down...");
    }

    /// Leases one batch of undelivered notifications and pushes them.
    ///
    /// Delivery results decide the row's fate: success and permanently-gone
    /// endpoints are marked delivered; quota and transient errors leave the
    /// row for the next tick.
    ///
    /// # Errors
    /// Returns an error if the database transaction fails.
    #[tracing::instrument(level = "debug", skip(self), err)]
    pub async fn process_batch(&self) -> anyhow::Result<()> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let batch = self.repo.fetch_undelivered(&mut tx, self.config.dispatch_batch_limit).await?;
        if batch.is_empty() {
            tracing::debug!("No undelivered notifications found");
            return Ok(());
        }

        tracing::info!(count = batch.len(), "Dispatching leased notifications");

        let retry_strategy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(250))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(2);

        for notification in &batch {
            let payload = PushPayload::from(notification);

            let result = (|| async { self.provider.deliver(&payload).await })
                .retry(&retry_strategy)
                .when(|e| matches!(e, PushError::Other(_)))
                .notify(|e, delay| {
                    tracing::debug!(error = %e, ?delay, "Push delivery failed, retrying");
                })
                .await;

            match result {
                Ok(()) => {
                    self.repo.mark_delivered(&mut tx, notification.id).await?;
                    self.metrics.sent.add(1, &[]);
                }
                Err(PushError::Unregistered) => {
                    tracing::warn!(notification_id = %notification.id, "Webhook endpoint gone, dropping delivery");
                    self.repo.mark_delivered(&mut tx, notification.id).await?;
                    self.metrics.errors.add(1, &[KeyValue::new("reason", "unregistered")]);
                }
                Err(PushError::QuotaExceeded) => {
                    tracing::warn!("Push quota exceeded, deferring remainder of batch");
                    self.metrics.errors.add(1, &[KeyValue::new("reason", "quota_exceeded")]);
                    break;
                }
                Err(PushError::Other(e)) => {
                    tracing::error!(error = %e, notification_id = %notification.id, "Push delivery failed, will retry next tick");
                    self.metrics.errors.add(1, &[KeyValue::new("reason", "other")]);
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

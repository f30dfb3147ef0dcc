use crate::config::MessagingConfig;
use crate::error::AppError;
use crate::storage::DbPool;
use crate::storage::message_repo::MessageRepository;
use crate::storage::retry::with_retry;
use opentelemetry::{global, metrics::Counter};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::Instrument;

#[derive(Clone, Debug)]
struct Metrics {
    swept_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("threadline-server");
        Self {
            swept_total: meter
                .u64_counter("threadline_inbox_swept_total")
                .with_description("Total stale unread messages auto-marked read")
                .build(),
        }
    }
}

/// Periodically marks long-unread messages as read, one batch at a time.
#[derive(Debug)]
pub struct InboxSweeperWorker {
    pool: DbPool,
    repo: MessageRepository,
    config: MessagingConfig,
    metrics: Metrics,
}

impl InboxSweeperWorker {
    #[must_use]
    pub fn new(pool: DbPool, repo: MessageRepository, config: MessagingConfig) -> Self {
        Self { pool, repo, config, metrics: Metrics::new() }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.sweep_interval_secs));

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.perform_sweep()
                        .instrument(tracing::info_span!("inbox_sweep_iteration"))
                        .await
                    {
                        tracing::error!(error = ?e, "Inbox sweep iteration failed");
                    }
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Inbox sweeper shutting down...");
    }

    /// Walks the stale-unread backlog batch by batch until a short batch
    /// signals the end.
    ///
    /// # Errors
    /// Returns an error if the database connection or query fails.
    #[tracing::instrument(skip(self), err, fields(total_swept = tracing::field::Empty))]
    pub async fn perform_sweep(&self) -> Result<(), AppError> {
        let cutoff = OffsetDateTime::now_utc() - time::Duration::days(self.config.sweep_after_days);
        let batch_limit = self.config.sweep_batch_limit;
        let mut total_swept: u64 = 0;

        loop {
            let swept = with_retry("inbox_sweep_batch", || async {
                let mut conn = self.pool.acquire().await?;
                self.repo.mark_old_unread_read(&mut conn, cutoff, batch_limit).await
            })
            .await?;

            total_swept += swept;
            if swept < batch_limit as u64 {
                break;
            }
        }

        if total_swept > 0 {
            tracing::info!(count = %total_swept, "Auto-marked stale unread messages as read");
            self.metrics.swept_total.add(total_swept, &[]);
            tracing::Span::current().record("total_swept", total_swept);
        }

        Ok(())
    }
}

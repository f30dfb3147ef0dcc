use crate::error::AppError;
use crate::storage::DbPool;
use crate::storage::refresh_token_repo::RefreshTokenRepository;
use std::time::Duration;
use tracing::Instrument;

const CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Prunes expired refresh tokens so the table does not grow unbounded.
#[derive(Debug)]
pub struct TokenCleanupWorker {
    pool: DbPool,
    repo: RefreshTokenRepository,
}

impl TokenCleanupWorker {
    #[must_use]
    pub fn new(pool: DbPool, repo: RefreshTokenRepository) -> Self {
        Self { pool, repo }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.perform_cleanup()
                        .instrument(tracing::info_span!("token_cleanup_iteration"))
                        .await
                    {
                        tracing::error!(error = ?e, "Token cleanup iteration failed");
                    }
                }
                _ = shutdown.changed() => {}
            }
        }
        tracing::info!("Token cleanup loop shutting down...");
    }

    /// Deletes every refresh token past its expiry.
    ///
    /// # Errors
    /// Returns an error if the database connection or query fails.
    #[tracing::instrument(skip(self), err)]
    pub async fn perform_cleanup(&self) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = self.repo.delete_expired(&mut conn).await?;
        if deleted > 0 {
            tracing::info!(count = %deleted, "Deleted expired refresh tokens");
        }
        Ok(())
    }
}

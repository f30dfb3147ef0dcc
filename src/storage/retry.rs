use crate::error::AppError;
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;

/// Whether a database error is worth retrying. Connection-level failures and
/// serialization conflicts are; constraint violations, missing rows and other
/// application errors are not.
#[must_use]
pub fn is_transient(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| {
            // 40001 serialization_failure, 40P01 deadlock_detected,
            // class 53 insufficient_resources, class 57 operator_intervention
            code == "40001" || code == "40P01" || code.starts_with("53") || code.starts_with("57")
        }),
        _ => false,
    }
}

fn strategy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(2))
        .with_max_times(2)
}

/// Runs a database operation, retrying transient failures with exponential
/// backoff. Permanent errors are returned immediately.
///
/// # Errors
/// Returns the final error once the retry budget is exhausted.
pub async fn with_retry<T, F, Fut>(operation: &'static str, f: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    f.retry(&strategy())
        .when(|error| matches!(error, AppError::Database(db_err) if is_transient(db_err)))
        .notify(|error, delay| {
            tracing::warn!(%operation, error = %error, ?delay, "Transient database error, retrying");
        })
        .await
}

use crate::domain::notification::Notification;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PushError {
    #[error("Endpoint is no longer registered")]
    Unregistered,
    #[error("Rate limit exceeded")]
    QuotaExceeded,
    #[error("External service error: {0}")]
    Other(#[from] anyhow::Error),
}

/// What gets POSTed to the webhook for one notification.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PushPayload {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub kind: &'static str,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&Notification> for PushPayload {
    fn from(notification: &Notification) -> Self {
        Self {
            notification_id: notification.id,
            user_id: notification.user_id,
            kind: notification.kind.as_str(),
            body: notification.body.clone(),
            created_at: notification.created_at,
        }
    }
}

#[async_trait]
pub trait PushProvider: Send + Sync + std::fmt::Debug {
    /// Delivers one notification payload.
    ///
    /// # Errors
    /// Returns `PushError::Unregistered` when the endpoint is gone for good
    /// and the notification should not be retried.
    async fn deliver(&self, payload: &PushPayload) -> Result<(), PushError>;
}

/// Pushes notifications to a configured HTTP endpoint as JSON.
#[derive(Debug)]
pub struct WebhookPushProvider {
    client: reqwest::Client,
    url: String,
}

impl WebhookPushProvider {
    #[must_use]
    pub fn new(url: String) -> Self {
        Self { client: reqwest::Client::new(), url }
    }
}

#[async_trait]
impl PushProvider for WebhookPushProvider {
    async fn deliver(&self, payload: &PushPayload) -> Result<(), PushError> {
        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| PushError::Other(anyhow::anyhow!("webhook request failed: {e}")))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            reqwest::StatusCode::NOT_FOUND | reqwest::StatusCode::GONE => Err(PushError::Unregistered),
            reqwest::StatusCode::TOO_MANY_REQUESTS => Err(PushError::QuotaExceeded),
            status => Err(PushError::Other(anyhow::anyhow!("webhook returned {status}"))),
        }
    }
}

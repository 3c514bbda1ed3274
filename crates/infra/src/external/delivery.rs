//! Delivery client used by the reminder run's fan-out.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use donorhub_reminders::ReminderId;

/// Why a single dispatch failed. Every variant is a per-item outcome, never
/// a run-level failure.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("delivery endpoint returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Invokes the delivery action for one reminder.
///
/// Success means the endpoint affirmatively reported completion (2xx);
/// anything else is a [`DeliveryError`].
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn deliver(&self, reminder_id: ReminderId) -> Result<(), DeliveryError>;
}

/// HTTP delivery client: POST `{reminder_id}` to the configured endpoint.
#[derive(Debug, Clone)]
pub struct HttpDeliveryClient {
    client: reqwest::Client,
    url: String,
    service_secret: String,
}

impl HttpDeliveryClient {
    pub fn new(url: String, service_secret: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build delivery http client");
        Self {
            client,
            url,
            service_secret,
        }
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn deliver(&self, reminder_id: ReminderId) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.service_secret)
            .json(&serde_json::json!({ "reminder_id": reminder_id }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

//! Transactional-email provider client.

use async_trait::async_trait;

use super::ProviderError;

/// One outbound message, ready to hand to the provider.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), ProviderError>;
}

/// HTTP client for the transactional-email provider's send endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmailClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    from: String,
}

impl HttpEmailClient {
    pub fn new(api_base: String, api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl EmailClient for HttpEmailClient {
    async fn send(&self, email: &OutboundEmail) -> Result<(), ProviderError> {
        let url = format!("{}/send", self.api_base.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": email.to,
                "subject": email.subject,
                "text": email.body,
            }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Dev/test stand-in used when no provider is configured: logs instead of
/// sending.
#[derive(Debug, Default, Clone)]
pub struct LogOnlyEmailClient;

#[async_trait]
impl EmailClient for LogOnlyEmailClient {
    async fn send(&self, email: &OutboundEmail) -> Result<(), ProviderError> {
        tracing::info!(to = %email.to, subject = %email.subject, "email send (log-only mode)");
        Ok(())
    }
}

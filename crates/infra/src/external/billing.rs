//! Billing provider client (subscription checkout + customer portal).
//!
//! Thin passthrough: the provider owns customers, subscriptions, and the
//! hosted pages; this service only asks for page URLs.

use async_trait::async_trait;
use serde::Deserialize;

use super::ProviderError;

/// A hosted checkout page minted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
}

/// A hosted billing-portal page minted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PortalSession {
    pub url: String,
}

#[async_trait]
pub trait BillingClient: Send + Sync {
    async fn create_checkout_session(
        &self,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, ProviderError>;

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, ProviderError>;
}

/// HTTP client for the billing provider's session endpoints.
#[derive(Debug, Clone)]
pub struct HttpBillingClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl HttpBillingClient {
    pub fn new(api_base: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base,
            api_key,
        }
    }

    async fn post_session<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.api_base.trim_end_matches('/'), path);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl BillingClient for HttpBillingClient {
    async fn create_checkout_session(
        &self,
        price_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, ProviderError> {
        self.post_session(
            "/checkout/sessions",
            serde_json::json!({
                "price_id": price_id,
                "success_url": success_url,
                "cancel_url": cancel_url,
                "mode": "subscription",
            }),
        )
        .await
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, ProviderError> {
        self.post_session(
            "/billing_portal/sessions",
            serde_json::json!({
                "customer_id": customer_id,
                "return_url": return_url,
            }),
        )
        .await
    }
}

//! Outbound HTTP clients: reminder delivery, email provider, billing provider.

pub mod billing;
pub mod delivery;
pub mod email;

pub use billing::{BillingClient, CheckoutSession, HttpBillingClient, PortalSession};
pub use delivery::{DeliveryClient, DeliveryError, HttpDeliveryClient};
pub use email::{EmailClient, HttpEmailClient, LogOnlyEmailClient, OutboundEmail};

/// Failure talking to an external provider (email, billing).
///
/// Handlers map this to 502: the request was fine, the collaborator was not.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("provider response was malformed: {0}")]
    MalformedResponse(String),
}

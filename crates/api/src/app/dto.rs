//! Request DTOs that are not plain domain inputs, plus list envelopes.
//!
//! Create/update bodies reuse the domain `New*`/`*Update` types directly;
//! only the passthrough endpoints need their own shapes.

use serde::Deserialize;

use donorhub_donors::DonorId;
use donorhub_reminders::ReminderId;

#[derive(Debug, Deserialize)]
pub struct SendTemplateRequest {
    pub donor_id: DonorId,
}

#[derive(Debug, Deserialize)]
pub struct DeliverReminderRequest {
    pub reminder_id: ReminderId,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Deserialize)]
pub struct PortalRequest {
    pub customer_id: String,
    pub return_url: String,
}

/// `{"items": [...]}` envelope for list endpoints.
pub fn items<T: serde::Serialize>(items: Vec<T>) -> serde_json::Value {
    serde_json::json!({ "items": items })
}

//! Internal delivery action: the endpoint the reminder run fans out to.

use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use donorhub_infra::external::OutboundEmail;
use donorhub_reminders::ReminderStatus;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Deliver one reminder: load it, load its donor, send the email, mark sent.
///
/// On provider failure the reminder keeps its `in_flight` claim; the run
/// that dispatched us releases it (or the lease expires), so the reminder
/// becomes due again on a later pass.
pub async fn deliver_reminder(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::DeliverReminderRequest>,
) -> axum::response::Response {
    let mut reminder = match services.reminders.get_any(body.reminder_id).await {
        Ok(Some(reminder)) => reminder,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "reminder not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if reminder.status == ReminderStatus::Sent {
        return errors::json_error(StatusCode::CONFLICT, "conflict", "reminder already sent");
    }

    let donor = match services.donors.get(reminder.org_id, reminder.donor_id).await {
        Ok(Some(donor)) => donor,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "donor not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let email = OutboundEmail {
        to: donor.email.clone(),
        subject: reminder
            .subject
            .clone()
            .unwrap_or_else(|| "Reminder".to_string()),
        body: reminder.message.clone(),
    };

    if let Err(e) = services.email.send(&email).await {
        return errors::provider_error_to_response(e);
    }

    if let Err(e) = reminder.mark_sent(Utc::now()) {
        return errors::domain_error_to_response(e);
    }
    if let Err(e) = services.reminders.update(&reminder).await {
        return errors::store_error_to_response(e);
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "delivered": true, "reminder_id": reminder.id })),
    )
        .into_response()
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;

use donorhub_core::RecordId;
use donorhub_reminders::{NewReminder, Reminder, ReminderId, ReminderStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_reminder).get(list_reminders))
        .route("/:id", get(get_reminder).delete(delete_reminder))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    status: Option<String>,
}

fn parse_id(id: &str) -> Result<ReminderId, axum::response::Response> {
    id.parse::<RecordId>().map(ReminderId::new).map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid reminder id")
    })
}

pub async fn create_reminder(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Json(body): Json<NewReminder>,
) -> axum::response::Response {
    // The donor must exist in this org before we schedule work against it.
    match services.donors.get(org.org_id(), body.donor_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "donor not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    let reminder = match Reminder::create(org.org_id(), body, Utc::now()) {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.reminders.insert(&reminder).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(reminder)).into_response()
}

pub async fn list_reminders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    let status = match query.status.as_deref() {
        Some(raw) => match raw.parse::<ReminderStatus>() {
            Ok(status) => Some(status),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => None,
    };

    match services.reminders.list(org.org_id(), status).await {
        Ok(reminders) => (StatusCode::OK, Json(dto::items(reminders))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_reminder(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.reminders.get(org.org_id(), id).await {
        Ok(Some(reminder)) => (StatusCode::OK, Json(reminder)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "reminder not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_reminder(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.reminders.delete(org.org_id(), id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "reminder not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

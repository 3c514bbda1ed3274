//! Scheduler-triggered batch endpoints.

use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use donorhub_infra::jobs::RunError;

use crate::app::errors;
use crate::app::services::AppServices;

/// Run one reminder-processing pass.
///
/// The service-secret middleware has already vetted the caller; a bad bearer
/// never reaches this handler, so no query runs for it.
pub async fn process_reminders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.reminder_run.execute(Utc::now()).await {
        Ok(report) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "processed": report.summary.succeeded,
                "errors": report.summary.failed,
            })),
        )
            .into_response(),
        Err(RunError::Load(e)) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "load_failed",
            format!("failed to load due reminders: {e}"),
        ),
        // Dispatches completed; report the in-memory counts alongside the
        // audit failure.
        Err(RunError::Audit { summary, source }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": "audit_write_failed",
                "message": source.to_string(),
                "processed": summary.succeeded,
                "errors": summary.failed,
            })),
        )
            .into_response(),
    }
}

//! Admin surface: audit history for the batch jobs.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;

pub fn router() -> Router {
    Router::new().route("/job-runs", get(list_job_runs))
}

#[derive(Debug, Deserialize)]
pub struct JobRunsQuery {
    limit: Option<usize>,
}

pub async fn list_job_runs(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<crate::context::PrincipalContext>,
    Query(query): Query<JobRunsQuery>,
) -> axum::response::Response {
    if let Err(resp) = authz::require_admin(&principal) {
        return resp;
    }

    let limit = query.limit.unwrap_or(20).min(200);

    match services.audit.recent(limit).await {
        Ok(runs) => (StatusCode::OK, Json(dto::items(runs))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

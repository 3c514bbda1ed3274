use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use donorhub_core::RecordId;
use donorhub_workflows::{NewWorkflow, Workflow, WorkflowId, WorkflowUpdate};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_workflow).get(list_workflows))
        .route(
            "/:id",
            get(get_workflow).patch(update_workflow).delete(delete_workflow),
        )
        .route("/:id/toggle", post(toggle_workflow))
}

fn parse_id(id: &str) -> Result<WorkflowId, axum::response::Response> {
    id.parse::<RecordId>().map(WorkflowId::new).map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid workflow id")
    })
}

pub async fn create_workflow(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Json(body): Json<NewWorkflow>,
) -> axum::response::Response {
    let workflow = match Workflow::create(org.org_id(), body, Utc::now()) {
        Ok(w) => w,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.workflows.insert(&workflow).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(workflow)).into_response()
}

pub async fn list_workflows(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
) -> axum::response::Response {
    match services.workflows.list(org.org_id()).await {
        Ok(workflows) => (StatusCode::OK, Json(dto::items(workflows))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_workflow(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.workflows.get(org.org_id(), id).await {
        Ok(Some(workflow)) => (StatusCode::OK, Json(workflow)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "workflow not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_workflow(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
    Json(body): Json<WorkflowUpdate>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let mut workflow = match services.workflows.get(org.org_id(), id).await {
        Ok(Some(workflow)) => workflow,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "workflow not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(e) = workflow.apply_update(body, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    if let Err(e) = services.workflows.update(&workflow).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::OK, Json(workflow)).into_response()
}

pub async fn toggle_workflow(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let mut workflow = match services.workflows.get(org.org_id(), id).await {
        Ok(Some(workflow)) => workflow,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "workflow not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let enabled = workflow.toggle(Utc::now());

    if let Err(e) = services.workflows.update(&workflow).await {
        return errors::store_error_to_response(e);
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "id": workflow.id, "enabled": enabled })),
    )
        .into_response()
}

pub async fn delete_workflow(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.workflows.delete(org.org_id(), id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "workflow not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

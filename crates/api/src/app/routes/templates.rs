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
use donorhub_infra::external::OutboundEmail;
use donorhub_messaging::{EmailTemplate, NewTemplate, TemplateId, TemplateUpdate};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_template).get(list_templates))
        .route(
            "/:id",
            get(get_template).patch(update_template).delete(delete_template),
        )
        .route("/:id/send", post(send_template))
}

fn parse_id(id: &str) -> Result<TemplateId, axum::response::Response> {
    id.parse::<RecordId>().map(TemplateId::new).map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid template id")
    })
}

pub async fn create_template(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Json(body): Json<NewTemplate>,
) -> axum::response::Response {
    let template = match EmailTemplate::create(org.org_id(), body, Utc::now()) {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.templates.insert(&template).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(template)).into_response()
}

pub async fn list_templates(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
) -> axum::response::Response {
    match services.templates.list(org.org_id()).await {
        Ok(templates) => (StatusCode::OK, Json(dto::items(templates))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_template(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.templates.get(org.org_id(), id).await {
        Ok(Some(template)) => (StatusCode::OK, Json(template)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "template not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_template(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
    Json(body): Json<TemplateUpdate>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let mut template = match services.templates.get(org.org_id(), id).await {
        Ok(Some(template)) => template,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "template not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(e) = template.apply_update(body, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    if let Err(e) = services.templates.update(&template).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::OK, Json(template)).into_response()
}

pub async fn delete_template(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.templates.delete(org.org_id(), id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "template not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Render the template against a donor and forward to the email provider.
pub async fn send_template(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::SendTemplateRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let template = match services.templates.get(org.org_id(), id).await {
        Ok(Some(template)) => template,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "template not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let donor = match services.donors.get(org.org_id(), body.donor_id).await {
        Ok(Some(donor)) => donor,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "donor not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    let rendered = template.render(&donor.display_name, &donor.email);
    let email = OutboundEmail {
        to: donor.email.clone(),
        subject: rendered.subject,
        body: rendered.body,
    };

    if let Err(e) = services.email.send(&email).await {
        return errors::provider_error_to_response(e);
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "sent": true, "to": donor.email })),
    )
        .into_response()
}

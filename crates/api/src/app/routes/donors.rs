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
use donorhub_donors::{Donor, DonorId, DonorUpdate, NewDonor};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_donor).get(list_donors))
        .route("/:id", get(get_donor).patch(update_donor).delete(delete_donor))
}

fn parse_id(id: &str) -> Result<DonorId, axum::response::Response> {
    id.parse::<RecordId>()
        .map(DonorId::new)
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid donor id"))
}

pub async fn create_donor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Json(body): Json<NewDonor>,
) -> axum::response::Response {
    let donor = match Donor::create(org.org_id(), body, Utc::now()) {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.donors.insert(&donor).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(donor)).into_response()
}

pub async fn list_donors(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
) -> axum::response::Response {
    match services.donors.list(org.org_id()).await {
        Ok(donors) => (StatusCode::OK, Json(dto::items(donors))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_donor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.donors.get(org.org_id(), id).await {
        Ok(Some(donor)) => (StatusCode::OK, Json(donor)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "donor not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_donor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
    Json(body): Json<DonorUpdate>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let mut donor = match services.donors.get(org.org_id(), id).await {
        Ok(Some(donor)) => donor,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "donor not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(e) = donor.apply_update(body, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    if let Err(e) = services.donors.update(&donor).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::OK, Json(donor)).into_response()
}

pub async fn delete_donor(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.donors.delete(org.org_id(), id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "donor not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use donorhub_campaigns::{Campaign, CampaignId, CampaignUpdate, NewCampaign};
use donorhub_core::RecordId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_campaign).get(list_campaigns))
        .route(
            "/:id",
            get(get_campaign).patch(update_campaign).delete(delete_campaign),
        )
}

fn parse_id(id: &str) -> Result<CampaignId, axum::response::Response> {
    id.parse::<RecordId>().map(CampaignId::new).map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid campaign id")
    })
}

pub async fn create_campaign(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Json(body): Json<NewCampaign>,
) -> axum::response::Response {
    let campaign = match Campaign::create(org.org_id(), body, Utc::now()) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    if let Err(e) = services.campaigns.insert(&campaign).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(campaign)).into_response()
}

pub async fn list_campaigns(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
) -> axum::response::Response {
    match services.campaigns.list(org.org_id()).await {
        Ok(campaigns) => (StatusCode::OK, Json(dto::items(campaigns))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_campaign(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.campaigns.get(org.org_id(), id).await {
        Ok(Some(campaign)) => (StatusCode::OK, Json(campaign)).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "campaign not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_campaign(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
    Json(body): Json<CampaignUpdate>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let mut campaign = match services.campaigns.get(org.org_id(), id).await {
        Ok(Some(campaign)) => campaign,
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "campaign not found");
        }
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Err(e) = campaign.apply_update(body, Utc::now()) {
        return errors::domain_error_to_response(e);
    }

    if let Err(e) = services.campaigns.update(&campaign).await {
        return errors::store_error_to_response(e);
    }

    (StatusCode::OK, Json(campaign)).into_response()
}

pub async fn delete_campaign(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.campaigns.delete(org.org_id(), id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "campaign not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

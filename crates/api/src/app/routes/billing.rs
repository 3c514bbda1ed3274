//! Billing passthroughs: the provider hosts the pages, we fetch the URLs.

use std::sync::Arc;

use axum::{
    Json, Router, extract::Extension, http::StatusCode, response::IntoResponse, routing::post,
};

use donorhub_infra::external::BillingClient;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/portal", post(create_portal))
}

fn billing_client(
    services: &AppServices,
) -> Result<&Arc<dyn BillingClient>, axum::response::Response> {
    services.billing.as_ref().ok_or_else(|| {
        errors::json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "billing_unconfigured",
            "no billing provider is configured",
        )
    })
}

pub async fn create_checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Json(body): Json<dto::CheckoutRequest>,
) -> axum::response::Response {
    let billing = match billing_client(&services) {
        Ok(client) => client,
        Err(resp) => return resp,
    };

    tracing::info!(org_id = %org.org_id(), price_id = %body.price_id, "creating checkout session");

    match billing
        .create_checkout_session(&body.price_id, &body.success_url, &body.cancel_url)
        .await
    {
        Ok(session) => {
            (StatusCode::OK, Json(serde_json::json!({ "url": session.url }))).into_response()
        }
        Err(e) => errors::provider_error_to_response(e),
    }
}

pub async fn create_portal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<crate::context::OrgContext>,
    Json(body): Json<dto::PortalRequest>,
) -> axum::response::Response {
    let billing = match billing_client(&services) {
        Ok(client) => client,
        Err(resp) => return resp,
    };

    tracing::info!(org_id = %org.org_id(), "creating billing portal session");

    match billing
        .create_portal_session(&body.customer_id, &body.return_url)
        .await
    {
        Ok(session) => {
            (StatusCode::OK, Json(serde_json::json!({ "url": session.url }))).into_response()
        }
        Err(e) => errors::provider_error_to_response(e),
    }
}

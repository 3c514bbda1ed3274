//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: infrastructure wiring (stores, external clients, run core)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request DTOs and JSON envelopes
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use donorhub_infra::config::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(&config).await?);
    Ok(build_router(services, &config))
}

/// Assemble the router from pre-built services.
pub fn build_router(services: Arc<services::AppServices>, config: &AppConfig) -> Router {
    let jwt = Arc::new(donorhub_auth::Hs256JwtValidator::new(
        config.jwt_secret.as_bytes(),
    ));
    let auth_state = middleware::AuthState { jwt };
    let secret_state = middleware::ServiceSecretState {
        secret: Arc::new(config.cron_secret.clone()),
    };

    // Org surface: bearer JWT, org + principal context.
    let org_routes = routes::org_router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    // Scheduler surface: shared service secret, no org context.
    let service_routes = routes::service_router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            secret_state,
            middleware::service_secret_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(org_routes)
        .merge(service_routes)
}

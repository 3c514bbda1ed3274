use axum::{
    Router,
    routing::{get, post},
};

pub mod admin;
pub mod billing;
pub mod campaigns;
pub mod cron;
pub mod donors;
pub mod internal;
pub mod reminders;
pub mod system;
pub mod templates;
pub mod workflows;

/// Router for all org-scoped (JWT-authenticated) endpoints.
pub fn org_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/campaigns", campaigns::router())
        .nest("/donors", donors::router())
        .nest("/templates", templates::router())
        .nest("/workflows", workflows::router())
        .nest("/reminders", reminders::router())
        .nest("/billing", billing::router())
        .nest("/admin", admin::router())
}

/// Router for the scheduler-facing endpoints (service-secret auth).
pub fn service_router() -> Router {
    Router::new()
        .route("/cron/process-reminders", post(cron::process_reminders))
        .route(
            "/internal/reminders/deliver",
            post(internal::deliver_reminder),
        )
}

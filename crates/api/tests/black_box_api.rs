use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use donorhub_auth::{JwtClaims, Role};
use donorhub_core::{OrgId, UserId};
use donorhub_infra::config::AppConfig;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

const JWT_SECRET: &str = "test-jwt-secret";
const CRON_SECRET: &str = "test-cron-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Bind an ephemeral port first so the config's delivery URL can point
    /// back at this same server, then serve the prod router on it.
    async fn spawn_with(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let mut config = AppConfig {
            bind_addr: addr.to_string(),
            database_url: None,
            jwt_secret: JWT_SECRET.to_string(),
            cron_secret: CRON_SECRET.to_string(),
            delivery_url: format!("{base_url}/internal/reminders/deliver"),
            dispatch_concurrency: 4,
            dispatch_lease_secs: 300,
            delivery_timeout: Duration::from_secs(5),
            email_api_base: None,
            email_api_key: String::new(),
            email_from: "no-reply@donorhub.test".to_string(),
            billing_api_base: None,
            billing_api_key: String::new(),
        };
        configure(&mut config);

        let app = donorhub_api::app::build_app(config)
            .await
            .expect("failed to build app");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(org_id: OrgId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        org_id,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn member_token(org_id: OrgId) -> String {
    mint_jwt(org_id, vec![Role::new("member")])
}

async fn create_donor(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
    email: &str,
) -> serde_json::Value {
    let res = client
        .post(format!("{base_url}/donors"))
        .bearer_auth(token)
        .json(&json!({ "display_name": name, "email": email, "phone": null, "notes": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn create_due_reminder(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    donor_id: &serde_json::Value,
) -> serde_json::Value {
    let res = client
        .post(format!("{base_url}/reminders"))
        .bearer_auth(token)
        .json(&json!({
            "donor_id": donor_id,
            "subject": "Pledge due",
            "message": "Your monthly pledge is due.",
            "due_at": Utc::now() - ChronoDuration::minutes(5),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_open() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_org_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for path in ["/whoami", "/campaigns", "/donors", "/reminders"] {
        let res = client
            .get(format!("{}{path}", srv.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path} was open");
    }
}

#[tokio::test]
async fn org_context_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let org_id = OrgId::new();
    let token = mint_jwt(org_id, vec![Role::new("admin")]);

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["org_id"].as_str().unwrap(), org_id.to_string());
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "admin"));
}

#[tokio::test]
async fn campaign_crud_lifecycle() {
    let srv = TestServer::spawn().await;
    let token = member_token(OrgId::new());
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/campaigns", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Spring Appeal",
            "description": "Annual spring fundraiser",
            "goal_minor": 5_000_00,
            "starts_at": null,
            "ends_at": null,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "draft");
    assert_eq!(created["raised_minor"], 0);

    let res = client
        .patch(format!("{}/campaigns/{id}", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "status": "active", "goal_minor": 7_500_00 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["status"], "active");
    assert_eq!(updated["goal_minor"], 750_000);

    let res = client
        .get(format!("{}/campaigns", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let listed: serde_json::Value = res.json().await.unwrap();
    assert_eq!(listed["items"].as_array().unwrap().len(), 1);

    let res = client
        .delete(format!("{}/campaigns/{id}", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/campaigns/{id}", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn orgs_cannot_see_each_others_records() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token_a = member_token(OrgId::new());
    let token_b = member_token(OrgId::new());

    let donor = create_donor(&client, &srv.base_url, &token_a, "Ada", "ada@example.org").await;
    let donor_id = donor["id"].as_str().unwrap();

    let res = client
        .get(format!("{}/donors/{donor_id}", srv.base_url))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/donors", srv.base_url))
        .bearer_auth(&token_b)
        .send()
        .await
        .unwrap();
    let listed: serde_json::Value = res.json().await.unwrap();
    assert!(listed["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn template_send_renders_merge_fields() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = member_token(OrgId::new());

    let donor = create_donor(&client, &srv.base_url, &token, "Ada", "ada@example.org").await;

    let res = client
        .post(format!("{}/templates", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Thanks",
            "subject": "Thank you, {{name}}!",
            "body": "Dear {{name}}, we have your address as {{email}}.",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let template: serde_json::Value = res.json().await.unwrap();
    let template_id = template["id"].as_str().unwrap();

    // Email is log-only in tests; a 200 means render + send both went through.
    let res = client
        .post(format!("{}/templates/{template_id}/send", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "donor_id": donor["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["sent"], true);
    assert_eq!(body["to"], "ada@example.org");
}

#[tokio::test]
async fn reminder_list_filters_by_status() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = member_token(OrgId::new());

    let donor = create_donor(&client, &srv.base_url, &token, "Ada", "ada@example.org").await;
    create_due_reminder(&client, &srv.base_url, &token, &donor["id"]).await;

    let res = client
        .get(format!("{}/reminders?status=pending", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let pending: serde_json::Value = res.json().await.unwrap();
    assert_eq!(pending["items"].as_array().unwrap().len(), 1);

    let res = client
        .get(format!("{}/reminders?status=sent", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let sent: serde_json::Value = res.json().await.unwrap();
    assert!(sent["items"].as_array().unwrap().is_empty());

    let res = client
        .get(format!("{}/reminders?status=bogus", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cron_endpoint_requires_the_service_secret() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let url = format!("{}/cron/process-reminders", srv.base_url);

    let res = client.post(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(&url)
        .bearer_auth("wrong-secret")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // An org JWT is not a service secret.
    let res = client
        .post(&url)
        .bearer_auth(member_token(OrgId::new()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.post(&url).bearer_auth(CRON_SECRET).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn reminder_run_processes_due_reminders_end_to_end() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let org_id = OrgId::new();
    let token = mint_jwt(org_id, vec![Role::new("admin")]);

    let donor = create_donor(&client, &srv.base_url, &token, "Ada", "ada@example.org").await;
    let reminder = create_due_reminder(&client, &srv.base_url, &token, &donor["id"]).await;
    let reminder_id = reminder["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/cron/process-reminders", srv.base_url))
        .bearer_auth(CRON_SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["processed"], 1);
    assert_eq!(body["errors"], 0);

    // The reminder went through the loopback delivery endpoint and is sent.
    let res = client
        .get(format!("{}/reminders/{reminder_id}", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched["status"], "sent");

    // Exactly one audit row, status success.
    let res = client
        .get(format!("{}/admin/job-runs", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let runs: serde_json::Value = res.json().await.unwrap();
    let items = runs["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["job_name"], "reminders.process");
    assert_eq!(items[0]["status"], "success");
    assert_eq!(items[0]["succeeded"], 1);
    assert_eq!(items[0]["failed"], 0);
}

#[tokio::test]
async fn failed_delivery_yields_a_partial_run_and_names_the_reminder() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let org_id = OrgId::new();
    let token = mint_jwt(org_id, vec![Role::new("admin")]);

    let healthy = create_donor(&client, &srv.base_url, &token, "Ada", "ada@example.org").await;
    let doomed = create_donor(&client, &srv.base_url, &token, "Ghost", "ghost@example.org").await;

    create_due_reminder(&client, &srv.base_url, &token, &healthy["id"]).await;
    let failing = create_due_reminder(&client, &srv.base_url, &token, &doomed["id"]).await;
    let failing_id = failing["id"].as_str().unwrap().to_string();

    // Deleting the donor makes that reminder's delivery 404 during the run.
    let doomed_id = doomed["id"].as_str().unwrap();
    let res = client
        .delete(format!("{}/donors/{doomed_id}", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .post(format!("{}/cron/process-reminders", srv.base_url))
        .bearer_auth(CRON_SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["processed"], 1);
    assert_eq!(body["errors"], 1);

    // Audit row is partial and its detail names the failing reminder.
    let res = client
        .get(format!("{}/admin/job-runs", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let runs: serde_json::Value = res.json().await.unwrap();
    let row = &runs["items"][0];
    assert_eq!(row["status"], "partial");
    let outcomes = row["detail"]["outcomes"].as_array().unwrap();
    let failed = outcomes.iter().find(|o| o["result"] == "error").unwrap();
    assert_eq!(failed["reminder_id"].as_str().unwrap(), failing_id);
    assert!(failed["detail"].as_str().unwrap().contains("404"));

    // The failed reminder is pending again, eligible for the next pass.
    let res = client
        .get(format!("{}/reminders/{failing_id}", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched["status"], "pending");
}

#[tokio::test]
async fn empty_run_still_records_one_audit_row() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let token = mint_jwt(OrgId::new(), vec![Role::new("admin")]);

    let res = client
        .post(format!("{}/cron/process-reminders", srv.base_url))
        .bearer_auth(CRON_SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["processed"], 0);
    assert_eq!(body["errors"], 0);

    let res = client
        .get(format!("{}/admin/job-runs", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let runs: serde_json::Value = res.json().await.unwrap();
    let items = runs["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["succeeded"], 0);
    assert_eq!(items[0]["failed"], 0);
}

#[tokio::test]
async fn job_run_history_is_admin_only() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/admin/job-runs", srv.base_url))
        .bearer_auth(member_token(OrgId::new()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn billing_checkout_forwards_to_the_provider() {
    // Stub billing provider that mints a fixed hosted-page URL.
    let provider_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let provider_addr = provider_listener.local_addr().unwrap();
    let provider_app = axum::Router::new()
        .route(
            "/checkout/sessions",
            axum::routing::post(|| async {
                axum::Json(json!({ "url": "https://pay.example.com/session/abc123" }))
            }),
        )
        .route(
            "/billing_portal/sessions",
            axum::routing::post(|| async {
                axum::Json(json!({ "url": "https://pay.example.com/portal/xyz789" }))
            }),
        );
    let provider_handle = tokio::spawn(async move {
        axum::serve(provider_listener, provider_app).await.unwrap();
    });

    let srv = TestServer::spawn_with(|config| {
        config.billing_api_base = Some(format!("http://{provider_addr}"));
        config.billing_api_key = "sk_test_123".to_string();
    })
    .await;

    let client = reqwest::Client::new();
    let token = member_token(OrgId::new());

    let res = client
        .post(format!("{}/billing/checkout", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "price_id": "price_monthly",
            "success_url": "https://app.example.com/ok",
            "cancel_url": "https://app.example.com/cancel",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["url"], "https://pay.example.com/session/abc123");

    let res = client
        .post(format!("{}/billing/portal", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "customer_id": "cus_123",
            "return_url": "https://app.example.com/settings",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["url"], "https://pay.example.com/portal/xyz789");

    provider_handle.abort();
}

#[tokio::test]
async fn billing_without_provider_is_unavailable() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/billing/checkout", srv.base_url))
        .bearer_auth(member_token(OrgId::new()))
        .json(&json!({
            "price_id": "price_monthly",
            "success_url": "https://app.example.com/ok",
            "cancel_url": "https://app.example.com/cancel",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

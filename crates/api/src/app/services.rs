//! Infrastructure wiring: stores, external clients, and the reminder run.

use std::sync::Arc;

use chrono::Duration;

use donorhub_infra::config::AppConfig;
use donorhub_infra::db;
use donorhub_infra::external::{
    BillingClient, EmailClient, HttpBillingClient, HttpDeliveryClient, HttpEmailClient,
    LogOnlyEmailClient,
};
use donorhub_infra::jobs::ReminderRun;
use donorhub_infra::store::{
    CampaignStore, DonorStore, InMemoryCampaignStore, InMemoryDonorStore, InMemoryReminderStore,
    InMemoryRunAuditStore, InMemoryTemplateStore, InMemoryWorkflowStore, PostgresCampaignStore,
    PostgresDonorStore, PostgresReminderStore, PostgresRunAuditStore, PostgresTemplateStore,
    PostgresWorkflowStore, ReminderStore, RunAuditStore, TemplateStore, WorkflowStore,
};

/// Everything the handlers need, built once at startup.
pub struct AppServices {
    pub campaigns: Arc<dyn CampaignStore>,
    pub donors: Arc<dyn DonorStore>,
    pub templates: Arc<dyn TemplateStore>,
    pub workflows: Arc<dyn WorkflowStore>,
    pub reminders: Arc<dyn ReminderStore>,
    pub audit: Arc<dyn RunAuditStore>,
    pub email: Arc<dyn EmailClient>,
    /// `None` when no billing provider is configured; the billing routes
    /// then answer 503.
    pub billing: Option<Arc<dyn BillingClient>>,
    pub reminder_run: ReminderRun,
}

/// Wire stores and clients from config.
///
/// `DATABASE_URL` set selects Postgres; unset selects the in-memory stores
/// (dev/test mode).
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let (campaigns, donors, templates, workflows, reminders, audit): (
        Arc<dyn CampaignStore>,
        Arc<dyn DonorStore>,
        Arc<dyn TemplateStore>,
        Arc<dyn WorkflowStore>,
        Arc<dyn ReminderStore>,
        Arc<dyn RunAuditStore>,
    ) = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url).await?;
            tracing::info!("using postgres stores");
            (
                Arc::new(PostgresCampaignStore::new(pool.clone())),
                Arc::new(PostgresDonorStore::new(pool.clone())),
                Arc::new(PostgresTemplateStore::new(pool.clone())),
                Arc::new(PostgresWorkflowStore::new(pool.clone())),
                Arc::new(PostgresReminderStore::new(pool.clone())),
                Arc::new(PostgresRunAuditStore::new(pool)),
            )
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory stores");
            (
                Arc::new(InMemoryCampaignStore::new()),
                Arc::new(InMemoryDonorStore::new()),
                Arc::new(InMemoryTemplateStore::new()),
                Arc::new(InMemoryWorkflowStore::new()),
                Arc::new(InMemoryReminderStore::new()),
                Arc::new(InMemoryRunAuditStore::new()),
            )
        }
    };

    let email: Arc<dyn EmailClient> = match &config.email_api_base {
        Some(base) => Arc::new(HttpEmailClient::new(
            base.clone(),
            config.email_api_key.clone(),
            config.email_from.clone(),
        )),
        None => {
            tracing::info!("EMAIL_API_BASE not set; outbound email is log-only");
            Arc::new(LogOnlyEmailClient)
        }
    };

    let billing: Option<Arc<dyn BillingClient>> = config.billing_api_base.as_ref().map(|base| {
        Arc::new(HttpBillingClient::new(
            base.clone(),
            config.billing_api_key.clone(),
        )) as Arc<dyn BillingClient>
    });

    let delivery = Arc::new(HttpDeliveryClient::new(
        config.delivery_url.clone(),
        config.cron_secret.clone(),
        config.delivery_timeout,
    ));

    let reminder_run = ReminderRun::new(
        reminders.clone(),
        audit.clone(),
        delivery,
        config.dispatch_concurrency,
        Duration::seconds(config.dispatch_lease_secs),
    );

    Ok(AppServices {
        campaigns,
        donors,
        templates,
        workflows,
        reminders,
        audit,
        email,
        billing,
        reminder_run,
    })
}

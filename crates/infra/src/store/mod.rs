//! Persistence layer.
//!
//! One store trait per entity, each with an in-memory implementation
//! (tests/dev) and a Postgres implementation (production). Every org-facing
//! query filters on `org_id`; cross-org access is structurally impossible.

pub mod audit;
pub mod campaigns;
pub mod donors;
pub mod reminders;
pub mod templates;
pub mod workflows;

pub use audit::{InMemoryRunAuditStore, PostgresRunAuditStore, RunAuditRecord, RunAuditStore};
pub use campaigns::{CampaignStore, InMemoryCampaignStore, PostgresCampaignStore};
pub use donors::{DonorStore, InMemoryDonorStore, PostgresDonorStore};
pub use reminders::{InMemoryReminderStore, PostgresReminderStore, ReminderStore};
pub use templates::{InMemoryTemplateStore, PostgresTemplateStore, TemplateStore};
pub use workflows::{InMemoryWorkflowStore, PostgresWorkflowStore, WorkflowStore};

/// Store operation error.
///
/// Infrastructure failures only; "not found" is an `Option`, and domain
/// rejections never reach this layer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Storage(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {operation}"))
        }
        other => StoreError::Storage(format!("sqlx error in {operation}: {other}")),
    }
}

//! Append-only job-run audit log.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use donorhub_reminders::RunStatus;

use super::{StoreError, map_sqlx_error};

/// Durable summary of one batch-job invocation.
///
/// Exactly one row per run; rows are never updated or deleted.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunAuditRecord {
    pub id: Uuid,
    /// Job identifier, e.g. `"reminders.process"`.
    pub job_name: String,
    pub status: RunStatus,
    pub succeeded: i64,
    pub failed: i64,
    /// `{total, succeeded, failed, outcomes: [...]}` with the full per-item
    /// outcome list.
    pub detail: Value,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[async_trait]
pub trait RunAuditStore: Send + Sync {
    async fn append(&self, record: &RunAuditRecord) -> Result<(), StoreError>;
    /// Most recent runs first.
    async fn recent(&self, limit: usize) -> Result<Vec<RunAuditRecord>, StoreError>;
}

/// In-memory audit log for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRunAuditStore {
    rows: RwLock<Vec<RunAuditRecord>>,
}

impl InMemoryRunAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunAuditStore for InMemoryRunAuditStore {
    async fn append(&self, record: &RunAuditRecord) -> Result<(), StoreError> {
        self.rows.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<RunAuditRecord>, StoreError> {
        let rows = self.rows.read().unwrap();
        Ok(rows.iter().rev().take(limit).cloned().collect())
    }
}

/// Postgres-backed audit log.
#[derive(Debug, Clone)]
pub struct PostgresRunAuditStore {
    pool: PgPool,
}

impl PostgresRunAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<RunAuditRecord, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(RunAuditRecord {
        id: row.try_get("id")?,
        job_name: row.try_get("job_name")?,
        status: status
            .parse::<RunStatus>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        succeeded: row.try_get("succeeded")?,
        failed: row.try_get("failed")?,
        detail: row.try_get("detail")?,
        started_at: row.try_get("started_at")?,
        finished_at: row.try_get("finished_at")?,
    })
}

#[async_trait]
impl RunAuditStore for PostgresRunAuditStore {
    async fn append(&self, record: &RunAuditRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO job_runs
                (id, job_name, status, succeeded, failed, detail, started_at, finished_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(&record.job_name)
        .bind(record.status.as_str())
        .bind(record.succeeded)
        .bind(record.failed)
        .bind(&record.detail)
        .bind(record.started_at)
        .bind(record.finished_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("append_job_run", e))?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<RunAuditRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, job_name, status, succeeded, failed, detail, started_at, finished_at
            FROM job_runs
            ORDER BY finished_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("recent_job_runs", e))?;

        rows.iter()
            .map(record_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("recent_job_runs", e))
    }
}

//! Workflow-definition persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use donorhub_core::{OrgId, RecordId};
use donorhub_workflows::{TriggerKind, Workflow, WorkflowId};

use super::{StoreError, map_sqlx_error};

#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn insert(&self, workflow: &Workflow) -> Result<(), StoreError>;
    async fn get(&self, org_id: OrgId, id: WorkflowId) -> Result<Option<Workflow>, StoreError>;
    /// List an org's workflows, newest first.
    async fn list(&self, org_id: OrgId) -> Result<Vec<Workflow>, StoreError>;
    async fn update(&self, workflow: &Workflow) -> Result<(), StoreError>;
    async fn delete(&self, org_id: OrgId, id: WorkflowId) -> Result<bool, StoreError>;
}

/// In-memory workflow store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    rows: RwLock<HashMap<WorkflowId, Workflow>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn insert(&self, workflow: &Workflow) -> Result<(), StoreError> {
        let mut rows = self.rows.write().unwrap();
        rows.insert(workflow.id, workflow.clone());
        Ok(())
    }

    async fn get(&self, org_id: OrgId, id: WorkflowId) -> Result<Option<Workflow>, StoreError> {
        let rows = self.rows.read().unwrap();
        Ok(rows.get(&id).filter(|w| w.org_id == org_id).cloned())
    }

    async fn list(&self, org_id: OrgId) -> Result<Vec<Workflow>, StoreError> {
        let rows = self.rows.read().unwrap();
        let mut result: Vec<_> = rows
            .values()
            .filter(|w| w.org_id == org_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update(&self, workflow: &Workflow) -> Result<(), StoreError> {
        let mut rows = self.rows.write().unwrap();
        if let Some(existing) = rows.get_mut(&workflow.id) {
            *existing = workflow.clone();
        }
        Ok(())
    }

    async fn delete(&self, org_id: OrgId, id: WorkflowId) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().unwrap();
        match rows.get(&id) {
            Some(w) if w.org_id == org_id => {
                rows.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Postgres-backed workflow store.
#[derive(Debug, Clone)]
pub struct PostgresWorkflowStore {
    pool: PgPool,
}

impl PostgresWorkflowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn workflow_from_row(row: &PgRow) -> Result<Workflow, sqlx::Error> {
    let trigger: String = row.try_get("trigger_kind")?;
    Ok(Workflow {
        id: WorkflowId::new(RecordId::from_uuid(row.try_get("id")?)),
        org_id: OrgId::from_uuid(row.try_get("org_id")?),
        name: row.try_get("name")?,
        trigger: trigger
            .parse::<TriggerKind>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        steps: row.try_get("steps")?,
        enabled: row.try_get("enabled")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl WorkflowStore for PostgresWorkflowStore {
    async fn insert(&self, workflow: &Workflow) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO workflows
                (id, org_id, name, trigger_kind, steps, enabled, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(workflow.id.0.as_uuid())
        .bind(workflow.org_id.as_uuid())
        .bind(&workflow.name)
        .bind(workflow.trigger.as_str())
        .bind(&workflow.steps)
        .bind(workflow.enabled)
        .bind(workflow.created_at)
        .bind(workflow.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_workflow", e))?;

        Ok(())
    }

    async fn get(&self, org_id: OrgId, id: WorkflowId) -> Result<Option<Workflow>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, org_id, name, trigger_kind, steps, enabled, created_at, updated_at
            FROM workflows
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(id.0.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_workflow", e))?;

        row.as_ref()
            .map(workflow_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_workflow", e))
    }

    async fn list(&self, org_id: OrgId) -> Result<Vec<Workflow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, org_id, name, trigger_kind, steps, enabled, created_at, updated_at
            FROM workflows
            WHERE org_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_workflows", e))?;

        rows.iter()
            .map(workflow_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_workflows", e))
    }

    async fn update(&self, workflow: &Workflow) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE workflows
            SET name = $3, trigger_kind = $4, steps = $5, enabled = $6, updated_at = $7
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(workflow.org_id.as_uuid())
        .bind(workflow.id.0.as_uuid())
        .bind(&workflow.name)
        .bind(workflow.trigger.as_str())
        .bind(&workflow.steps)
        .bind(workflow.enabled)
        .bind(workflow.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_workflow", e))?;

        Ok(())
    }

    async fn delete(&self, org_id: OrgId, id: WorkflowId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM workflows WHERE org_id = $1 AND id = $2")
            .bind(org_id.as_uuid())
            .bind(id.0.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_workflow", e))?;

        Ok(result.rows_affected() > 0)
    }
}

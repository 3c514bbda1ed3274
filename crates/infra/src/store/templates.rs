//! Email template persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use donorhub_core::{OrgId, RecordId};
use donorhub_messaging::{EmailTemplate, TemplateId};

use super::{StoreError, map_sqlx_error};

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn insert(&self, template: &EmailTemplate) -> Result<(), StoreError>;
    async fn get(&self, org_id: OrgId, id: TemplateId) -> Result<Option<EmailTemplate>, StoreError>;
    /// List an org's templates, newest first.
    async fn list(&self, org_id: OrgId) -> Result<Vec<EmailTemplate>, StoreError>;
    async fn update(&self, template: &EmailTemplate) -> Result<(), StoreError>;
    async fn delete(&self, org_id: OrgId, id: TemplateId) -> Result<bool, StoreError>;
}

/// In-memory template store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    rows: RwLock<HashMap<TemplateId, EmailTemplate>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn insert(&self, template: &EmailTemplate) -> Result<(), StoreError> {
        let mut rows = self.rows.write().unwrap();
        rows.insert(template.id, template.clone());
        Ok(())
    }

    async fn get(&self, org_id: OrgId, id: TemplateId) -> Result<Option<EmailTemplate>, StoreError> {
        let rows = self.rows.read().unwrap();
        Ok(rows.get(&id).filter(|t| t.org_id == org_id).cloned())
    }

    async fn list(&self, org_id: OrgId) -> Result<Vec<EmailTemplate>, StoreError> {
        let rows = self.rows.read().unwrap();
        let mut result: Vec<_> = rows
            .values()
            .filter(|t| t.org_id == org_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update(&self, template: &EmailTemplate) -> Result<(), StoreError> {
        let mut rows = self.rows.write().unwrap();
        if let Some(existing) = rows.get_mut(&template.id) {
            *existing = template.clone();
        }
        Ok(())
    }

    async fn delete(&self, org_id: OrgId, id: TemplateId) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().unwrap();
        match rows.get(&id) {
            Some(t) if t.org_id == org_id => {
                rows.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Postgres-backed template store.
#[derive(Debug, Clone)]
pub struct PostgresTemplateStore {
    pool: PgPool,
}

impl PostgresTemplateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn template_from_row(row: &PgRow) -> Result<EmailTemplate, sqlx::Error> {
    Ok(EmailTemplate {
        id: TemplateId::new(RecordId::from_uuid(row.try_get("id")?)),
        org_id: OrgId::from_uuid(row.try_get("org_id")?),
        name: row.try_get("name")?,
        subject: row.try_get("subject")?,
        body: row.try_get("body")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl TemplateStore for PostgresTemplateStore {
    async fn insert(&self, template: &EmailTemplate) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO email_templates
                (id, org_id, name, subject, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(template.id.0.as_uuid())
        .bind(template.org_id.as_uuid())
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.body)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_template", e))?;

        Ok(())
    }

    async fn get(&self, org_id: OrgId, id: TemplateId) -> Result<Option<EmailTemplate>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, org_id, name, subject, body, created_at, updated_at
            FROM email_templates
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(id.0.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_template", e))?;

        row.as_ref()
            .map(template_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_template", e))
    }

    async fn list(&self, org_id: OrgId) -> Result<Vec<EmailTemplate>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, org_id, name, subject, body, created_at, updated_at
            FROM email_templates
            WHERE org_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_templates", e))?;

        rows.iter()
            .map(template_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_templates", e))
    }

    async fn update(&self, template: &EmailTemplate) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE email_templates
            SET name = $3, subject = $4, body = $5, updated_at = $6
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(template.org_id.as_uuid())
        .bind(template.id.0.as_uuid())
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.body)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_template", e))?;

        Ok(())
    }

    async fn delete(&self, org_id: OrgId, id: TemplateId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM email_templates WHERE org_id = $1 AND id = $2")
            .bind(org_id.as_uuid())
            .bind(id.0.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_template", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use donorhub_messaging::NewTemplate;

    #[tokio::test]
    async fn org_scoping_holds_for_templates() {
        let store = InMemoryTemplateStore::new();
        let org = OrgId::new();
        let template = EmailTemplate::create(
            org,
            NewTemplate {
                name: "Thanks".to_string(),
                subject: "Thank you {{name}}".to_string(),
                body: "We appreciate it.".to_string(),
            },
            Utc::now(),
        )
        .unwrap();
        store.insert(&template).await.unwrap();

        assert!(store.get(org, template.id).await.unwrap().is_some());
        assert!(store.get(OrgId::new(), template.id).await.unwrap().is_none());
    }
}

//! Campaign persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use donorhub_campaigns::{Campaign, CampaignId, CampaignStatus};
use donorhub_core::{OrgId, RecordId};

use super::{StoreError, map_sqlx_error};

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn insert(&self, campaign: &Campaign) -> Result<(), StoreError>;
    async fn get(&self, org_id: OrgId, id: CampaignId) -> Result<Option<Campaign>, StoreError>;
    /// List an org's campaigns, newest first.
    async fn list(&self, org_id: OrgId) -> Result<Vec<Campaign>, StoreError>;
    async fn update(&self, campaign: &Campaign) -> Result<(), StoreError>;
    async fn delete(&self, org_id: OrgId, id: CampaignId) -> Result<bool, StoreError>;
}

/// In-memory campaign store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCampaignStore {
    rows: RwLock<HashMap<CampaignId, Campaign>>,
}

impl InMemoryCampaignStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampaignStore for InMemoryCampaignStore {
    async fn insert(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let mut rows = self.rows.write().unwrap();
        rows.insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn get(&self, org_id: OrgId, id: CampaignId) -> Result<Option<Campaign>, StoreError> {
        let rows = self.rows.read().unwrap();
        Ok(rows.get(&id).filter(|c| c.org_id == org_id).cloned())
    }

    async fn list(&self, org_id: OrgId) -> Result<Vec<Campaign>, StoreError> {
        let rows = self.rows.read().unwrap();
        let mut result: Vec<_> = rows
            .values()
            .filter(|c| c.org_id == org_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn update(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let mut rows = self.rows.write().unwrap();
        if let Some(existing) = rows.get_mut(&campaign.id) {
            *existing = campaign.clone();
        }
        Ok(())
    }

    async fn delete(&self, org_id: OrgId, id: CampaignId) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().unwrap();
        match rows.get(&id) {
            Some(c) if c.org_id == org_id => {
                rows.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Postgres-backed campaign store.
#[derive(Debug, Clone)]
pub struct PostgresCampaignStore {
    pool: PgPool,
}

impl PostgresCampaignStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn campaign_from_row(row: &PgRow) -> Result<Campaign, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Campaign {
        id: CampaignId::new(RecordId::from_uuid(row.try_get("id")?)),
        org_id: OrgId::from_uuid(row.try_get("org_id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        goal_minor: row.try_get("goal_minor")?,
        raised_minor: row.try_get("raised_minor")?,
        status: status
            .parse::<CampaignStatus>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        starts_at: row.try_get("starts_at")?,
        ends_at: row.try_get("ends_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl CampaignStore for PostgresCampaignStore {
    async fn insert(&self, campaign: &Campaign) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO campaigns
                (id, org_id, name, description, goal_minor, raised_minor,
                 status, starts_at, ends_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(campaign.id.0.as_uuid())
        .bind(campaign.org_id.as_uuid())
        .bind(&campaign.name)
        .bind(&campaign.description)
        .bind(campaign.goal_minor)
        .bind(campaign.raised_minor)
        .bind(campaign.status.as_str())
        .bind(campaign.starts_at)
        .bind(campaign.ends_at)
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_campaign", e))?;

        Ok(())
    }

    async fn get(&self, org_id: OrgId, id: CampaignId) -> Result<Option<Campaign>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, org_id, name, description, goal_minor, raised_minor,
                   status, starts_at, ends_at, created_at, updated_at
            FROM campaigns
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(org_id.as_uuid())
        .bind(id.0.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_campaign", e))?;

        row.as_ref()
            .map(campaign_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_campaign", e))
    }

    async fn list(&self, org_id: OrgId) -> Result<Vec<Campaign>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, org_id, name, description, goal_minor, raised_minor,
                   status, starts_at, ends_at, created_at, updated_at
            FROM campaigns
            WHERE org_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(org_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_campaigns", e))?;

        rows.iter()
            .map(campaign_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_campaigns", e))
    }

    async fn update(&self, campaign: &Campaign) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE campaigns
            SET name = $3, description = $4, goal_minor = $5, raised_minor = $6,
                status = $7, starts_at = $8, ends_at = $9, updated_at = $10
            WHERE org_id = $1 AND id = $2
            "#,
        )
        .bind(campaign.org_id.as_uuid())
        .bind(campaign.id.0.as_uuid())
        .bind(&campaign.name)
        .bind(&campaign.description)
        .bind(campaign.goal_minor)
        .bind(campaign.raised_minor)
        .bind(campaign.status.as_str())
        .bind(campaign.starts_at)
        .bind(campaign.ends_at)
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_campaign", e))?;

        Ok(())
    }

    async fn delete(&self, org_id: OrgId, id: CampaignId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM campaigns WHERE org_id = $1 AND id = $2")
            .bind(org_id.as_uuid())
            .bind(id.0.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_campaign", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use donorhub_campaigns::NewCampaign;

    fn sample(org_id: OrgId, name: &str) -> Campaign {
        Campaign::create(
            org_id,
            NewCampaign {
                name: name.to_string(),
                description: None,
                goal_minor: 100_000,
                starts_at: None,
                ends_at: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_get_round_trip() {
        let store = InMemoryCampaignStore::new();
        let org = OrgId::new();
        let campaign = sample(org, "Spring Appeal");

        store.insert(&campaign).await.unwrap();
        let got = store.get(org, campaign.id).await.unwrap().unwrap();
        assert_eq!(got, campaign);
    }

    #[tokio::test]
    async fn get_is_org_scoped() {
        let store = InMemoryCampaignStore::new();
        let campaign = sample(OrgId::new(), "Spring Appeal");
        store.insert(&campaign).await.unwrap();

        assert!(store.get(OrgId::new(), campaign.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_only_returns_own_org() {
        let store = InMemoryCampaignStore::new();
        let org1 = OrgId::new();
        let org2 = OrgId::new();
        store.insert(&sample(org1, "A")).await.unwrap();
        store.insert(&sample(org1, "B")).await.unwrap();
        store.insert(&sample(org2, "C")).await.unwrap();

        assert_eq!(store.list(org1).await.unwrap().len(), 2);
        assert_eq!(store.list(org2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_refuses_cross_org() {
        let store = InMemoryCampaignStore::new();
        let org = OrgId::new();
        let campaign = sample(org, "Spring Appeal");
        store.insert(&campaign).await.unwrap();

        assert!(!store.delete(OrgId::new(), campaign.id).await.unwrap());
        assert!(store.delete(org, campaign.id).await.unwrap());
        assert!(store.get(org, campaign.id).await.unwrap().is_none());
    }
}
